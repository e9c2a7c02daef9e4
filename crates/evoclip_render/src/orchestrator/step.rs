//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, TaskState};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step recorded its output
///
/// # Example
///
/// ```ignore
/// struct ValidateStep;
///
/// impl PipelineStep for ValidateStep {
///     fn name(&self) -> &str { "Validate" }
///
///     fn validate_input(&self, _ctx: &Context) -> StepResult<()> { Ok(()) }
///
///     fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()> {
///         let plan = state.plan.as_ref().ok_or_else(|| StepError::invalid_input("no plan"))?;
///         check_monotonic(&plan.timeline)
///     }
///
///     fn validate_output(&self, _ctx: &Context, _state: &TaskState) -> StepResult<()> { Ok(()) }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Step name (for logging and error context).
    fn name(&self) -> &str;

    /// Check preconditions that only depend on the context.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Do the work and record results in `state`.
    fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()>;

    /// Verify the step produced valid output.
    fn validate_output(&self, ctx: &Context, state: &TaskState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
