//! Pipeline orchestrator for one render invocation.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Plan      (segments, draft timeline, fit counts)
//!     ├── Step: Render    (single-pass, legacy fallback)
//!     ├── Step: Validate  (timeline ordering)
//!     └── Step: Publish   (video + timeline upload)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use evoclip_render::orchestrator::{create_standard_pipeline, Context, TaskState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new(request, settings, work_dir, services, logger);
//! let mut state = TaskState::new("task-123");
//! pipeline.run(&ctx, &mut state)?;
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{PlanStep, PublishStep, RenderStep, ValidateStep};
pub use types::{
    Context, ProgressCallback, PublishOutput, RenderOutput, Services, TaskState,
};

/// Create the standard pipeline: Plan, Render, Validate, Publish.
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(PlanStep::new())
        .with_step(RenderStep::new())
        .with_step(ValidateStep::new())
        .with_step(PublishStep::new())
}
