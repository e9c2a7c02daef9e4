//! Plan step - binds sentences to scenes and audio, decides audio fit.

use std::fs;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, TaskState};
use crate::planning::SegmentPlanner;

/// Runs the segment planner and records the plan.
pub struct PlanStep;

impl PlanStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlanStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PlanStep {
    fn name(&self) -> &str {
        "Plan"
    }

    fn description(&self) -> &str {
        "Plan segments and audio fit"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.task_id.trim().is_empty() {
            return Err(StepError::invalid_input("task_id is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()> {
        fs::create_dir_all(&ctx.work_dir)
            .map_err(|e| StepError::io_error("creating work directory", e))?;

        let planner = SegmentPlanner::new(
            ctx.services.store.as_ref(),
            ctx.services.probe.as_ref(),
            &ctx.settings.storage.videos_bucket,
            &ctx.work_dir,
            &ctx.logger,
        )
        .with_max_speed(ctx.settings.render.audio_fit_max_speed);

        let plan = planner.plan(&ctx.request)?;

        ctx.logger.info(&format!(
            "Planned {} segments ({} skipped), {}ms total; speedup={} trim={} pad={}",
            plan.segments.len(),
            plan.skipped_count(),
            plan.total_duration_ms(),
            plan.counts.speedup,
            plan.counts.trim,
            plan.counts.pad
        ));

        state.plan = Some(plan);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &TaskState) -> StepResult<()> {
        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Plan not recorded"))?;
        if plan.segments.is_empty() {
            return Err(StepError::invalid_output("Plan has no segments"));
        }
        Ok(())
    }
}
