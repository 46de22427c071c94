//! Error types for the compose pipeline.
//!
//! Context chains through layers: Job → Step → Stage error → Detail.
//! Every step error maps to a stable `error_kind` string for the failure
//! response envelope.

use thiserror::Error;

use crate::plan::PlanningError;
use crate::probe::ProbeError;
use crate::publish::PublishError;
use crate::render::RenderError;
use crate::resolve::ResolveError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at stage '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Failed to set up the job (create work directory, open log).
    #[error("Job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }
}

/// Error from a pipeline step.
///
/// Stage errors pass through transparently so their messages reach the
/// response envelope unwrapped.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Stable error kind string for the failure response.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::InvalidInput(_) => "InvalidInput",
            StepError::InvalidOutput(_) => "InvalidOutput",
            StepError::Resolve(e) => e.kind(),
            StepError::Probe(_) => "ProbeError",
            StepError::Planning(_) => "PlanningError",
            StepError::Render(e) => e.kind(),
            StepError::Publish(e) => e.kind(),
        }
    }

    /// The backend command line attached to the error, when one exists.
    pub fn command(&self) -> Option<&str> {
        match self {
            StepError::Render(e) => e.command(),
            _ => None,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_pass_through_transparently() {
        let err: StepError = PlanningError::SourceShorterThanBreak {
            actual: 8.0,
            required: 10.0,
        }
        .into();
        assert_eq!(err.kind(), "PlanningError");
        assert!(err.to_string().contains("shorter than break"));
    }

    #[test]
    fn render_timeout_kind_is_distinct() {
        let err: StepError = RenderError::Timeout {
            secs: 300,
            command: "ffmpeg -i ...".into(),
        }
        .into();
        assert_eq!(err.kind(), "RenderTimeout");
        assert_eq!(err.command(), Some("ffmpeg -i ..."));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::invalid_input("no video supplied");
        let pipeline_err = PipelineError::step_failed("job_42", "Resolve", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("job_42"));
        assert!(msg.contains("Resolve"));
    }

    #[test]
    fn resolve_kinds_map_through() {
        let err: StepError = ResolveError::Decode("bad padding".into()).into();
        assert_eq!(err.kind(), "AssetDecodeError");
    }
}
