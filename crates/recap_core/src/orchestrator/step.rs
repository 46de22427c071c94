//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// Trait for compose pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - check preconditions before execution
/// 2. `execute` - perform the step's work
/// 3. `validate_output` - verify the step produced valid output
///
/// # Example
///
/// ```ignore
/// struct ProbeStep;
///
/// impl PipelineStep for ProbeStep {
///     fn name(&self) -> &str { "Probe" }
///
///     fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
///         if state.assets.is_none() {
///             return Err(StepError::invalid_input("Assets not resolved"));
///         }
///         Ok(())
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
///         // Run ffprobe, record the profile...
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
///         if state.profile.is_none() {
///             return Err(StepError::invalid_output("Profile not recorded"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Step name, used for logging and as the `stage` of failure responses.
    fn name(&self) -> &str;

    /// Validate preconditions against the context and accumulated state.
    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Perform the step's work and record results in `state`.
    ///
    /// Returns `StepOutcome::Success` on completion, or
    /// `StepOutcome::Skipped` when the step determined it has nothing to do.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Verify the step produced valid output.
    ///
    /// Called only after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;
}
