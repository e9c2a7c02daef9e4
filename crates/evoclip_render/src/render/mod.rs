//! Renderers and the degradation policy between them.
//!
//! ```text
//! Planned ─┬─ single_pass ─► SinglePass ─┬─ ok ─────────────► Done(single_pass)
//!          │                             ├─ err, fallback ──► LegacyFallback
//!          │                             └─ err, no fallback ► Failed
//!          └─ legacy ──────► Legacy ─────┬─ ok ─────────────► Done(legacy)
//!                                        └─ err ────────────► Failed
//! LegacyFallback ─┬─ ok ─► Done(legacy_fallback)
//!                 └─ err ► Failed
//! ```
//!
//! A renderer failure is retried at most once, on the other pipeline.

pub mod legacy;
pub mod single_pass;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::logging::TaskLogger;
use crate::media::{MediaTranscoder, OutputSpec, TranscodeError};
use crate::models::{PipelineMode, PipelineUsed};
use crate::planning::Segment;

/// Terminal render failures.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Single-pass render failed: {0}")]
    SinglePassFailed(#[source] TranscodeError),

    #[error("Legacy render failed: {0}")]
    LegacyFailed(#[source] TranscodeError),
}

impl RenderError {
    /// Stable error code.
    pub fn code(&self) -> String {
        match self {
            RenderError::SinglePassFailed(e) => format!("single_pass_render_failed:{}", e),
            RenderError::LegacyFailed(e) => format!("legacy_render_failed:{}", e),
        }
    }
}

/// Which pipeline to try first and whether to fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationPolicy {
    pub mode: PipelineMode,
    pub allow_fallback: bool,
}

/// Inputs shared by both renderers.
pub struct RenderJob<'a> {
    pub source_videos: &'a [PathBuf],
    pub segments: &'a [Segment],
    pub work_dir: &'a Path,
    pub output: OutputSpec,
}

#[derive(Debug)]
enum RenderState {
    Planned,
    SinglePass,
    LegacyFallback,
    Legacy,
    Done(PipelineUsed),
    Failed(RenderError),
}

/// Render `job`, degrading from single-pass to legacy when permitted.
///
/// Returns the pipeline that produced the output.
pub fn render_with_policy(
    transcoder: &dyn MediaTranscoder,
    logger: &TaskLogger,
    policy: DegradationPolicy,
    job: &RenderJob<'_>,
) -> Result<PipelineUsed, RenderError> {
    let run_legacy = |used: PipelineUsed| {
        logger.section(&used.to_string());
        match legacy::render(transcoder, logger, job.segments, job.work_dir, &job.output) {
            Ok(()) => RenderState::Done(used),
            Err(e) => RenderState::Failed(RenderError::LegacyFailed(e)),
        }
    };

    let mut state = RenderState::Planned;

    loop {
        state = match state {
            RenderState::Planned => match policy.mode {
                PipelineMode::SinglePass => RenderState::SinglePass,
                PipelineMode::Legacy => RenderState::Legacy,
            },

            RenderState::SinglePass => {
                logger.section("single_pass");
                match single_pass::render(
                    transcoder,
                    logger,
                    job.source_videos,
                    job.segments,
                    job.output.clone(),
                ) {
                    Ok(()) => RenderState::Done(PipelineUsed::SinglePass),
                    Err(e) if policy.allow_fallback => {
                        logger.warn(&format!("Single-pass render failed, falling back: {}", e));
                        RenderState::LegacyFallback
                    }
                    Err(e) => RenderState::Failed(RenderError::SinglePassFailed(e)),
                }
            }

            RenderState::LegacyFallback => run_legacy(PipelineUsed::LegacyFallback),
            RenderState::Legacy => run_legacy(PipelineUsed::Legacy),

            RenderState::Done(used) => return Ok(used),

            RenderState::Failed(e) => {
                logger.error(&e.to_string());
                return Err(e);
            }
        };
    }
}
