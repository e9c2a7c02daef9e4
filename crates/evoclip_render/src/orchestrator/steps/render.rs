//! Render step - produces the final video, degrading to legacy on failure.

use crate::media::OutputSpec;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RenderOutput, TaskState};
use crate::render::{render_with_policy, DegradationPolicy, RenderJob};

/// Renders the planned segments into `<work_dir>/final.mp4`.
pub struct RenderStep;

impl RenderStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RenderStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RenderStep {
    fn name(&self) -> &str {
        "Render"
    }

    fn description(&self) -> &str {
        "Render final video"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()> {
        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Plan not recorded"))?;

        let final_video = ctx.final_video_path();
        let render = &ctx.settings.render;
        let policy = DegradationPolicy {
            mode: render.pipeline_mode,
            allow_fallback: render.allow_legacy_fallback,
        };
        let job = RenderJob {
            source_videos: &plan.source_videos,
            segments: &plan.segments,
            work_dir: &ctx.work_dir,
            output: OutputSpec::from_settings(&final_video, render),
        };

        ctx.logger.info(&format!(
            "Rendering {} segments, mode={} fallback={}",
            plan.segments.len(),
            policy.mode,
            policy.allow_fallback
        ));
        let pipeline_used =
            render_with_policy(ctx.services.transcoder.as_ref(), &ctx.logger, policy, &job)?;
        ctx.logger.info(&format!("Rendered with {}", pipeline_used));

        state.render = Some(RenderOutput {
            final_video,
            pipeline_used,
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &TaskState) -> StepResult<()> {
        let render = state
            .render
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Render output not recorded"))?;
        if !render.final_video.exists() {
            return Err(StepError::invalid_output(format!(
                "Rendered file missing: {}",
                render.final_video.display()
            )));
        }
        Ok(())
    }
}
