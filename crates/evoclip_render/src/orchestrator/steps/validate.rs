//! Validate step - post-render timeline ordering check.

use crate::models::TimelineEntry;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, TaskState};

/// Rejects timelines whose `start_ms` ever decreases.
///
/// Only ordering is checked; gaps between entries are allowed.
pub fn check_monotonic(timeline: &[TimelineEntry]) -> StepResult<()> {
    for (index, pair) in timeline.windows(2).enumerate() {
        if pair[1].start_ms < pair[0].start_ms {
            return Err(StepError::TimelineNonMonotonic {
                index: index + 1,
                previous_start_ms: pair[0].start_ms,
                start_ms: pair[1].start_ms,
            });
        }
    }
    Ok(())
}

pub struct ValidateStep;

impl ValidateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ValidateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ValidateStep {
    fn name(&self) -> &str {
        "Validate"
    }

    fn description(&self) -> &str {
        "Validate timeline ordering"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()> {
        if !state.has_render() {
            return Err(StepError::invalid_input("Render output not recorded"));
        }
        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Plan not recorded"))?;

        check_monotonic(&plan.timeline)?;
        ctx.logger
            .debug(&format!("Timeline of {} entries is ordered", plan.timeline.len()));
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, _state: &TaskState) -> StepResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start_ms: i64, end_ms: i64) -> TimelineEntry {
        let mut entry = TimelineEntry::skipped("scene", "s", "source.mp4", start_ms, "");
        entry.end_ms = end_ms;
        entry.skipped = start_ms == end_ms;
        entry
    }

    #[test]
    fn accepts_non_decreasing_starts() {
        let timeline = vec![entry(0, 1000), entry(1000, 1000), entry(1000, 2500)];
        assert!(check_monotonic(&timeline).is_ok());
        assert!(check_monotonic(&[]).is_ok());
    }

    #[test]
    fn accepts_gaps() {
        let timeline = vec![entry(0, 1000), entry(4000, 5000)];
        assert!(check_monotonic(&timeline).is_ok());
    }

    #[test]
    fn rejects_decreasing_start() {
        let timeline = vec![entry(0, 1000), entry(1000, 2000), entry(500, 900)];
        let err = check_monotonic(&timeline).unwrap_err();

        assert_eq!(err.code(), "timeline_non_monotonic");
        match err {
            StepError::TimelineNonMonotonic { index, previous_start_ms, start_ms } => {
                assert_eq!(index, 2);
                assert_eq!(previous_start_ms, 1000);
                assert_eq!(start_ms, 500);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
