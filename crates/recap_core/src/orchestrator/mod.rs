//! Compose pipeline orchestration.
//!
//! [`Composer`] is the single boundary operation: it takes a
//! [`ComposeRequest`], runs the staged pipeline (Resolve → Probe → Plan →
//! Render → Publish) in a job-scoped work directory, and always returns a
//! [`ComposeResponse`] envelope. The work directory is removed on every
//! exit path.

pub mod errors;
pub mod pipeline;
pub mod step;
pub mod steps;
pub mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use types::{Context, JobState, ProgressCallback, SharedProgress, StepOutcome};

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{ComposeRequest, ComposeResponse, JobStatus};
use crate::publish::{cleanup_work_dir, ObjectStore};
use steps::{PlanStep, ProbeStep, PublishStep, RenderStep, ResolveStep};

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a process-unique job identifier.
///
/// Timestamp for readability, counter for uniqueness under concurrency.
fn next_job_id() -> String {
    let seq = JOB_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!(
        "job_{}_{:04}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        seq
    )
}

/// The compositing engine's boundary object.
///
/// Holds settings and the optional upload destination; each `compose` call
/// is independent and safe to run concurrently from multiple threads.
pub struct Composer {
    settings: Settings,
    store: Option<Arc<dyn ObjectStore>>,
}

impl Composer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            store: None,
        }
    }

    /// Attach an object store for `uploaded` delivery.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Process one compose request to completion.
    pub fn compose(&self, request: ComposeRequest) -> ComposeResponse {
        self.compose_with(request, None, CancelHandle::new())
    }

    /// Process one request with a progress callback and an external
    /// cancellation handle.
    pub fn compose_with(
        &self,
        request: ComposeRequest,
        progress: Option<ProgressCallback>,
        cancel: CancelHandle,
    ) -> ComposeResponse {
        let job_id = next_job_id();
        let work_dir = PathBuf::from(&self.settings.paths.temp_root).join(&job_id);

        if let Err(e) = std::fs::create_dir_all(&work_dir) {
            let error = PipelineError::setup_failed(
                &job_id,
                format!("failed to create work directory {}: {}", work_dir.display(), e),
            );
            tracing::error!("{}", error);
            return failure_response(error, None);
        }

        let logger = match JobLogger::new(
            &job_id,
            &self.settings.paths.logs_folder,
            LogConfig::from(&self.settings.logging),
            None,
        ) {
            Ok(logger) => logger,
            Err(e) => {
                cleanup_work_dir(&work_dir, Duration::ZERO);
                let error =
                    PipelineError::setup_failed(&job_id, format!("failed to open job log: {}", e));
                tracing::error!("{}", error);
                return failure_response(error, None);
            }
        };

        logger.phase(&format!("Compose job {}", job_id));

        let pipeline = Pipeline::with_cancel(&cancel)
            .with_step(ResolveStep)
            .with_step(ProbeStep)
            .with_step(PlanStep)
            .with_step(RenderStep)
            .with_step(PublishStep::new(self.store.clone()));

        let mut ctx = Context::new(
            request,
            self.settings.clone(),
            &job_id,
            work_dir,
            Arc::clone(&logger),
            cancel,
        );
        if let Some(callback) = progress {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(&job_id);
        let run_result = pipeline.run(&ctx, &mut state);

        let response = match run_result {
            Ok(_) => match state.artifact.take() {
                Some(artifact) => {
                    state.status = JobStatus::Done;
                    ComposeResponse::Done { artifact }
                }
                None => {
                    state.status = JobStatus::Failed;
                    ComposeResponse::Failed {
                        stage: "Publish".to_string(),
                        error_kind: "InvalidOutput".to_string(),
                        message: "pipeline finished without an artifact".to_string(),
                        backend_trace: None,
                    }
                }
            },
            Err(e) => {
                state.status = JobStatus::Failed;
                failure_response(e, Some(&logger))
            }
        };

        cleanup_work_dir(
            &ctx.work_dir,
            Duration::from_millis(self.settings.render.cleanup_grace_ms),
        );
        logger.close();

        response
    }
}

/// Map a pipeline error onto the failure envelope, attaching the backend
/// command and stderr tail when the failing stage produced them.
fn failure_response(error: PipelineError, logger: Option<&Arc<JobLogger>>) -> ComposeResponse {
    match error {
        PipelineError::StepFailed {
            step_name, source, ..
        } => {
            let mut trace_parts = Vec::new();
            if let Some(command) = source.command() {
                trace_parts.push(command.to_string());
            }
            let tail = logger.map(|l| l.backend_tail()).unwrap_or_default();
            if !tail.is_empty() {
                trace_parts.push(tail);
            }
            let backend_trace = if trace_parts.is_empty() {
                None
            } else {
                Some(trace_parts.join("\n"))
            };

            ComposeResponse::Failed {
                stage: step_name,
                error_kind: source.kind().to_string(),
                message: source.to_string(),
                backend_trace,
            }
        }
        PipelineError::Cancelled { .. } => ComposeResponse::Failed {
            stage: "Pipeline".to_string(),
            error_kind: "Cancelled".to_string(),
            message: error.to_string(),
            backend_trace: None,
        },
        PipelineError::SetupFailed { .. } => ComposeResponse::Failed {
            stage: "Setup".to_string(),
            error_kind: "SetupError".to_string(),
            message: error.to_string(),
            backend_trace: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetInput;
    use tempfile::tempdir;

    fn test_settings(root: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.temp_root = root.join("work").to_string_lossy().to_string();
        settings.paths.logs_folder = root.join("logs").to_string_lossy().to_string();
        settings.render.cleanup_grace_ms = 0;
        // Point the tools somewhere that cannot exist so no test ever
        // shells out to a real binary.
        settings.tools.ffprobe_path = root.join("missing/ffprobe").to_string_lossy().to_string();
        settings.tools.ffmpeg_path = root.join("missing/ffmpeg").to_string_lossy().to_string();
        settings
    }

    fn request(video_payload: &str) -> ComposeRequest {
        ComposeRequest {
            video: AssetInput::inline(video_payload),
            chart: AssetInput::inline("aGVsbG8="),
            audio: None,
            policy: Default::default(),
            delivery: Default::default(),
            output_name: None,
        }
    }

    fn leftover_job_dirs(settings: &Settings) -> usize {
        std::fs::read_dir(&settings.paths.temp_root)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn malformed_inline_video_fails_at_resolve_and_cleans_up() {
        let root = tempdir().unwrap();
        let settings = test_settings(root.path());
        let composer = Composer::new(settings.clone());

        let response = composer.compose(request("!!not-base64!!"));

        match response {
            ComposeResponse::Failed {
                stage, error_kind, ..
            } => {
                assert_eq!(stage, "Resolve");
                assert_eq!(error_kind, "AssetDecodeError");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(leftover_job_dirs(&settings), 0);
    }

    #[test]
    fn unreachable_ffprobe_fails_at_probe_stage() {
        let root = tempdir().unwrap();
        let settings = test_settings(root.path());
        let composer = Composer::new(settings.clone());

        let response = composer.compose(request("aGVsbG8gd29ybGQ="));

        match response {
            ComposeResponse::Failed {
                stage, error_kind, ..
            } => {
                assert_eq!(stage, "Probe");
                assert_eq!(error_kind, "ProbeError");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(leftover_job_dirs(&settings), 0);
    }

    #[test]
    fn pre_cancelled_handle_stops_before_first_stage() {
        let root = tempdir().unwrap();
        let settings = test_settings(root.path());
        let composer = Composer::new(settings.clone());

        let cancel = CancelHandle::new();
        cancel.cancel();
        let response = composer.compose_with(request("aGVsbG8="), None, cancel);

        match response {
            ComposeResponse::Failed { error_kind, .. } => {
                assert_eq!(error_kind, "Cancelled");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(leftover_job_dirs(&settings), 0);
    }

    #[test]
    fn unwritable_temp_root_fails_at_setup() {
        let root = tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut settings = test_settings(root.path());
        // temp_root nested under a plain file: create_dir_all must fail.
        settings.paths.temp_root = blocker.join("work").to_string_lossy().to_string();
        let composer = Composer::new(settings);

        match composer.compose(request("aGVsbG8=")) {
            ComposeResponse::Failed {
                stage, error_kind, ..
            } => {
                assert_eq!(stage, "Setup");
                assert_eq!(error_kind, "SetupError");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    fn write_stub(dir: &std::path::Path, name: &str, script: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn render_percentages_reach_the_caller() {
        use std::sync::Mutex;

        let root = tempdir().unwrap();
        let mut settings = test_settings(root.path());

        // Stand-in probe reports a 2s silent 640x360 source; the stand-in
        // encoder emits machine progress at 1s and 2s, then writes the
        // output file named by its last argument.
        let probe = write_stub(
            root.path(),
            "stub-probe",
            "#!/bin/sh\n\
             cat <<'EOF'\n\
             {\"streams\":[{\"codec_type\":\"video\",\"width\":640,\"height\":360,\
             \"r_frame_rate\":\"25/1\"}],\"format\":{\"duration\":\"2.0\"}}\n\
             EOF\n",
        );
        let encoder = write_stub(
            root.path(),
            "stub-encoder",
            "#!/bin/sh\n\
             echo \"out_time_us=1000000\"\n\
             echo \"out_time_us=2000000\"\n\
             for last in \"$@\"; do :; done\n\
             printf 'encoded' > \"$last\"\n",
        );
        settings.tools.ffprobe_path = probe.to_string_lossy().to_string();
        settings.tools.ffmpeg_path = encoder.to_string_lossy().to_string();

        let seen: Arc<Mutex<Vec<(String, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |step, percent, _msg| {
            seen_clone.lock().unwrap().push((step.to_string(), percent));
        });

        let composer = Composer::new(settings.clone());
        let response =
            composer.compose_with(request("aGVsbG8="), Some(callback), CancelHandle::new());
        assert!(response.is_done(), "expected success, got {:?}", response);

        // Mid-render percentages (1s and 2s of a 2s output) arrive under
        // the Render step name, between the step-boundary updates.
        let updates = seen.lock().unwrap();
        assert!(updates.contains(&("Render".to_string(), 50)));
        assert!(updates.contains(&("Render".to_string(), 100)));
        assert_eq!(leftover_job_dirs(&settings), 0);
    }

    #[test]
    fn job_ids_are_unique() {
        let a = next_job_id();
        let b = next_job_id();
        assert_ne!(a, b);
    }

    #[test]
    fn failure_envelope_serializes_for_the_wire() {
        let root = tempdir().unwrap();
        let settings = test_settings(root.path());
        let composer = Composer::new(settings);

        let response = composer.compose(request("!!bad!!"));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"errorKind\":\"AssetDecodeError\""));
        assert!(json.contains("\"stage\":\"Resolve\""));
    }
}
