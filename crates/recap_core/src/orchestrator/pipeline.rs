//! Pipeline runner that executes compose steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// Steps execute in order with validation before and after each one.
/// Cancellation is honored at step boundaries; long-running steps also
/// poll the handle themselves.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a pipeline driven by an existing cancellation handle.
    pub fn with_cancel(handle: &CancelHandle) -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::clone(&handle.flag),
        }
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Get a cancellation handle for this pipeline.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step: check cancellation, `validate_input`, `execute`,
    /// then `validate_output` when execute reported success.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Pipeline cancelled before stage '{}'", step.name()));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let step_name = step.name();
            ctx.logger.phase(step_name);

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(step_name, percent, &format!("Starting {}", step_name));

            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Stage failed: {}", e));
                PipelineError::step_failed(&ctx.job_name, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                    }
                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");

        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running pipeline.
///
/// The pipeline stops at the next step boundary; the render step also
/// polls the handle and kills its child process.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// A standalone handle, for running stages outside a pipeline.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::StepResult;
    use std::sync::atomic::AtomicUsize;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = Pipeline::new()
            .with_step(CountingStep {
                name: "Resolve",
                execute_count: Arc::new(AtomicUsize::new(0)),
            })
            .with_step(CountingStep {
                name: "Probe",
                execute_count: Arc::new(AtomicUsize::new(0)),
            });

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Resolve", "Probe"]);
    }

    #[test]
    fn cancel_handle_works() {
        let pipeline = Pipeline::new();
        let handle = pipeline.cancel_handle();

        assert!(!pipeline.is_cancelled());
        handle.cancel();
        assert!(pipeline.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn standalone_handle_starts_clear() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
    }
}
