//! Planned segments and planner output.

use std::path::PathBuf;

use thiserror::Error;

use crate::fit::FitCounts;
use crate::media::MediaError;
use crate::models::{FitStrategy, TimelineEntry};

/// One renderable (scene, sentence, audio) triple.
///
/// `target_duration_ms` is the scene's source range length and never
/// depends on the audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub source_video_ref: String,
    /// Downloaded copy of the source video.
    pub source_video: PathBuf,
    pub audio_ref: String,
    /// Downloaded copy of the narration clip.
    pub audio_path: PathBuf,
    pub source_start_ms: i64,
    /// The planner sets this equal to `target_duration_ms`, so legacy
    /// looping only applies to hand-built segments.
    pub source_duration_ms: i64,
    pub target_duration_ms: i64,
    pub fit_strategy: FitStrategy,
    pub speed_factor: f64,
}

/// Everything the planner hands to the renderers.
#[derive(Debug, Clone, Default)]
pub struct PlanOutput {
    pub segments: Vec<Segment>,
    /// Draft timeline, one entry per sentence with a known scene.
    pub timeline: Vec<TimelineEntry>,
    pub counts: FitCounts,
    /// Downloaded source videos in registration order, without duplicates.
    pub source_videos: Vec<PathBuf>,
}

impl PlanOutput {
    /// Total output length in milliseconds.
    pub fn total_duration_ms(&self) -> i64 {
        self.segments.iter().map(|s| s.target_duration_ms).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.timeline.iter().filter(|e| e.skipped).count()
    }
}

/// Planning errors.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("No source video reference supplied")]
    EmptySourceVideoRefs,

    #[error("No sentence could be rendered")]
    NoRenderableSegments,

    #[error("Failed to fetch {what}: {source}")]
    Storage {
        what: String,
        #[source]
        source: MediaError,
    },
}

impl PlanError {
    pub fn storage(what: impl Into<String>, source: MediaError) -> Self {
        Self::Storage {
            what: what.into(),
            source,
        }
    }
}
