//! Data models for the render engine.
//!
//! This module contains the core data structures used throughout the crate:
//! - Enums for fit strategies, pipeline modes and audio status
//! - Input structures supplied by upstream collaborators (scenes, sentences, audio)
//! - Output structures persisted or returned to callers (timeline, stats, summary)

mod enums;
mod inputs;
mod timeline;

pub use enums::{AudioStatus, FitStrategy, PipelineMode, PipelineUsed};
pub use inputs::{AudioClip, RenderRequest, Scene, Sentence};
pub use timeline::{RenderStats, RenderSummary, TimelineEntry};
