//! Input structures produced by upstream collaborators.
//!
//! Scenes come from content analysis, sentences from script generation and
//! audio clips from speech synthesis. The engine never mutates them.

use serde::{Deserialize, Serialize};

use super::enums::AudioStatus;

/// A fixed-duration sub-range of a source video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Source video this scene was cut from (None = first supplied source).
    #[serde(default, alias = "source_video_key")]
    pub source_video_ref: Option<String>,
    /// Start of the range inside the source video (defaults to `start_ms`).
    #[serde(default)]
    pub source_start_ms: Option<i64>,
    /// End of the range inside the source video (defaults to `end_ms`).
    #[serde(default)]
    pub source_end_ms: Option<i64>,
}

impl Scene {
    /// Create a scene whose source range equals its timeline range.
    pub fn new(scene_id: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            scene_id: scene_id.into(),
            start_ms,
            end_ms,
            source_video_ref: None,
            source_start_ms: None,
            source_end_ms: None,
        }
    }

    /// Bind the scene to a specific source video.
    pub fn with_source_video(mut self, source_ref: impl Into<String>) -> Self {
        self.source_video_ref = Some(source_ref.into());
        self
    }

    /// Set an explicit source range.
    pub fn with_source_range(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.source_start_ms = Some(start_ms);
        self.source_end_ms = Some(end_ms);
        self
    }

    /// Authoritative scene duration.
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn source_start(&self) -> i64 {
        self.source_start_ms.unwrap_or(self.start_ms)
    }

    pub fn source_end(&self) -> i64 {
        self.source_end_ms.unwrap_or(self.end_ms)
    }

    /// Length of the source range, never less than 1ms.
    pub fn source_duration_ms(&self) -> i64 {
        (self.source_end() - self.source_start()).max(1)
    }
}

/// A narration line bound to one scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub sentence_id: String,
    pub scene_id: String,
    #[serde(default)]
    pub text: String,
}

impl Sentence {
    pub fn new(
        sentence_id: impl Into<String>,
        scene_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            scene_id: scene_id.into(),
            text: text.into(),
        }
    }
}

/// Synthesized narration audio for one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub sentence_id: String,
    #[serde(default)]
    pub status: AudioStatus,
    /// `bucket/object` reference to the audio file.
    #[serde(default, alias = "audio_path")]
    pub audio_ref: Option<String>,
    /// Duration reported by the synthesizer, used when probing fails.
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

impl AudioClip {
    /// A successfully synthesized clip.
    pub fn ok(sentence_id: impl Into<String>, audio_ref: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            status: AudioStatus::Ok,
            audio_ref: Some(audio_ref.into()),
            duration_ms: Some(duration_ms),
        }
    }

    /// A clip whose synthesis failed.
    pub fn failed(sentence_id: impl Into<String>) -> Self {
        Self {
            sentence_id: sentence_id.into(),
            status: AudioStatus::Failed,
            audio_ref: None,
            duration_ms: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AudioStatus::Ok
    }
}

/// Everything needed for one render invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderRequest {
    pub task_id: String,
    /// Single source reference accepted for older callers.
    #[serde(default, alias = "source_video_key")]
    pub source_video_ref: Option<String>,
    #[serde(default, alias = "source_video_keys")]
    pub source_video_refs: Vec<String>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    #[serde(default, alias = "audio_segments")]
    pub audio_clips: Vec<AudioClip>,
    /// Passed through untouched into the render stats.
    #[serde(default)]
    pub voice_profile_fallback: bool,
}

impl RenderRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    /// Source references to use, in order.
    ///
    /// A non-empty list wins (blank entries dropped); otherwise the single
    /// reference is used if present.
    pub fn normalized_source_refs(&self) -> Vec<String> {
        let listed: Vec<String> = self
            .source_video_refs
            .iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect();
        if !listed.is_empty() {
            return listed;
        }
        self.source_video_ref
            .iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect()
    }
}
