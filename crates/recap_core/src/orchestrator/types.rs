//! Core types for the compose pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{
    ComposeRequest, CompositionPlan, JobStatus, MediaProfile, OutputArtifact, ResolvedAssets,
};
use crate::render::RenderOutput;

use super::pipeline::CancelHandle;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Shared form of the progress callback, cloneable into worker threads.
pub type SharedProgress = Arc<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the request and shared resources that steps can read but not
/// modify. Mutable state goes in [`JobState`].
pub struct Context {
    /// The compose request being processed.
    pub request: ComposeRequest,
    /// Application settings.
    pub settings: Settings,
    /// Job name/identifier.
    pub job_name: String,
    /// Job-specific working directory (under temp_root).
    pub work_dir: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Cancellation handle, checked between steps and inside the render
    /// loop.
    pub cancel: CancelHandle,
    /// Optional progress callback, shared so long-running steps can report
    /// from their worker threads.
    progress_callback: Option<SharedProgress>,
}

impl Context {
    pub fn new(
        request: ComposeRequest,
        settings: Settings,
        job_name: impl Into<String>,
        work_dir: PathBuf,
        logger: Arc<JobLogger>,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            request,
            settings,
            job_name: job_name.into(),
            work_dir,
            logger,
            cancel,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(Arc::from(callback));
        self
    }

    /// Report progress to the callback, if set.
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Clone of the progress callback for steps that stream mid-step
    /// updates from their own threads.
    pub fn progress_handle(&self) -> Option<SharedProgress> {
        self.progress_callback.clone()
    }

    /// Whether the request carries a background audio input.
    pub fn has_background_audio(&self) -> bool {
        self.request.audio.is_some()
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Steps add their output to their own slot and never overwrite another
/// step's data.
#[derive(Debug, Default)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started (RFC 3339).
    pub started_at: Option<String>,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Resolved local assets (from the Resolve step).
    pub assets: Option<ResolvedAssets>,
    /// Source media profile (from the Probe step).
    pub profile: Option<MediaProfile>,
    /// Composition plan (from the Plan step).
    pub plan: Option<CompositionPlan>,
    /// Render result (from the Render step).
    pub render: Option<RenderOutput>,
    /// Delivered artifact (from the Publish step).
    pub artifact: Option<OutputArtifact>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_assets(&self) -> bool {
        self.assets.is_some()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}
