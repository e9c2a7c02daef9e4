//! Output structures: timeline entries, render stats and the summary.

use serde::{Deserialize, Serialize};

use super::enums::{FitStrategy, PipelineUsed};

/// One sentence's placement in the output video.
///
/// `start_ms`/`end_ms` are positions in the output timeline, not in the
/// source video. Skipped entries have zero length and do not advance the
/// running offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub scene_id: String,
    pub sentence_id: String,
    pub source_video_ref: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub audio_ref: Option<String>,
    pub subtitle_text: String,
    pub skipped: bool,
    pub target_duration_ms: i64,
    pub raw_audio_duration_ms: i64,
    /// Audio length after fitting; downstream sync checks read this first.
    pub final_audio_duration_ms: i64,
    pub audio_fit_strategy: FitStrategy,
    pub speed_factor: f64,
    #[serde(default)]
    pub audio_trimmed: bool,
}

impl TimelineEntry {
    /// A zero-length entry for a sentence that cannot be rendered.
    pub fn skipped(
        scene_id: impl Into<String>,
        sentence_id: impl Into<String>,
        source_video_ref: impl Into<String>,
        offset_ms: i64,
        subtitle_text: impl Into<String>,
    ) -> Self {
        Self {
            scene_id: scene_id.into(),
            sentence_id: sentence_id.into(),
            source_video_ref: source_video_ref.into(),
            start_ms: offset_ms,
            end_ms: offset_ms,
            audio_ref: None,
            subtitle_text: subtitle_text.into(),
            skipped: true,
            target_duration_ms: 0,
            raw_audio_duration_ms: 0,
            final_audio_duration_ms: 0,
            audio_fit_strategy: FitStrategy::None,
            speed_factor: 1.0,
            audio_trimmed: false,
        }
    }

    /// Output-timeline length of this entry.
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// Aggregate counters describing one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub speedup_count: u32,
    pub trim_count: u32,
    pub pad_count: u32,
    pub pipeline_mode_used: PipelineUsed,
    /// Voice synthesis fell back to a default profile upstream.
    pub voice_fallback_flag: bool,
}

/// Result returned to the calling workflow on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSummary {
    /// `bucket/key` of the uploaded video.
    pub output_video_ref: String,
    /// `bucket/key` of the uploaded timeline JSON.
    pub timeline_path: String,
    pub timeline: Vec<TimelineEntry>,
    pub render_stats: RenderStats,
}
