//! Render Executor: runs ffmpeg over a planned filter graph with a
//! deadline, cancellation, progress reporting, and stderr capture.
//!
//! One ffmpeg invocation per job. The child's stdout carries machine
//! progress (`-progress pipe:1`), stderr feeds the job logger's tail
//! buffer so failures can report the backend's last words.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::RenderSettings;
use crate::logging::JobLogger;
use crate::models::{CompositionPlan, MediaProfile, ResolvedAssets};
use crate::orchestrator::CancelHandle;

use super::filtergraph::{build_filter_complex, build_input_args, AUDIO_OUT, VIDEO_OUT};

/// Filename of the rendered artifact inside the work directory.
pub const OUTPUT_FILENAME: &str = "out.mp4";

/// Errors from the render stage.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to start ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg exited with code {exit_code}")]
    Failed {
        exit_code: i32,
        command: String,
        stderr_tail: String,
    },

    #[error("render timed out after {secs}s")]
    Timeout { secs: u64, command: String },

    #[error("render cancelled")]
    Cancelled,

    #[error("ffmpeg reported success but produced no output at {0}")]
    EmptyOutput(PathBuf),
}

impl RenderError {
    /// Error kind string for the failure response envelope. Timeouts are
    /// distinguishable from other render failures.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::Timeout { .. } => "RenderTimeout",
            RenderError::Cancelled => "RenderCancelled",
            _ => "RenderError",
        }
    }

    /// The command line that failed, when one was assembled.
    pub fn command(&self) -> Option<&str> {
        match self {
            RenderError::Failed { command, .. } | RenderError::Timeout { command, .. } => {
                Some(command)
            }
            _ => None,
        }
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Per-render progress callback receiving a 0-100 percentage.
pub type RenderProgress = Arc<dyn Fn(u32) + Send + Sync>;

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub output_path: PathBuf,
    /// Full command line, for the job log and diagnostics.
    pub command: String,
}

/// Executes planned renders through ffmpeg.
pub struct Renderer {
    ffmpeg_path: String,
    settings: RenderSettings,
    timeout: Duration,
}

impl Renderer {
    pub fn new(ffmpeg_path: impl Into<String>, settings: RenderSettings, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            settings,
            timeout,
        }
    }

    /// Render the plan into `<work_dir>/out.mp4`.
    ///
    /// Progress percentages parsed from the child's stdout are forwarded to
    /// `on_progress` (after the logger's compact-mode filtering). A non-zero
    /// exit, a deadline overrun, or cancellation all remove the partial
    /// output before returning.
    pub fn render(
        &self,
        plan: &CompositionPlan,
        profile: &MediaProfile,
        assets: &ResolvedAssets,
        work_dir: &Path,
        logger: &Arc<JobLogger>,
        cancel: &CancelHandle,
        on_progress: Option<RenderProgress>,
    ) -> RenderResult<RenderOutput> {
        let output_path = work_dir.join(OUTPUT_FILENAME);
        let args = build_render_args(plan, profile, assets, &self.settings, &output_path);
        let command_line = format!("{} {}", self.ffmpeg_path, args.join(" "));

        logger.command(&command_line);
        logger.clear_tail();

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::Spawn("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::Spawn("failed to capture stderr".to_string()))?;

        let total_secs = plan.video_total_duration();
        let progress_logger = Arc::clone(logger);
        let stdout_handle = std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines().map_while(Result::ok) {
                if let Some(done_secs) = parse_progress_line(&line) {
                    let percent = progress_percent(done_secs, total_secs);
                    if progress_logger.progress(percent) {
                        if let Some(ref callback) = on_progress {
                            callback(percent);
                        }
                    }
                }
            }
        });

        let stderr_logger = Arc::clone(logger);
        let stderr_handle = std::thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                let trimmed = line.trim_end();
                if !trimmed.is_empty() {
                    stderr_logger.backend_line(trimmed);
                }
            }
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                discard_partial(&output_path);
                return Err(RenderError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        discard_partial(&output_path);
                        return Err(RenderError::Timeout {
                            secs: self.timeout.as_secs(),
                            command: command_line,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(RenderError::Spawn(e.to_string())),
            }
        };

        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        if !status.success() {
            discard_partial(&output_path);
            return Err(RenderError::Failed {
                exit_code: status.code().unwrap_or(-1),
                command: command_line,
                stderr_tail: logger.backend_tail(),
            });
        }

        // Exit code 0 is not enough; a success with no bytes is a failure.
        let nonempty = std::fs::metadata(&output_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !nonempty {
            return Err(RenderError::EmptyOutput(output_path));
        }

        logger.success("Render complete");
        Ok(RenderOutput {
            output_path,
            command: command_line,
        })
    }
}

/// Assemble the full ffmpeg argument vector for a plan.
pub fn build_render_args(
    plan: &CompositionPlan,
    profile: &MediaProfile,
    assets: &ResolvedAssets,
    settings: &RenderSettings,
    output_path: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];
    args.extend(build_input_args(plan, assets));
    args.push("-filter_complex".into());
    args.push(build_filter_complex(plan, profile, settings));
    args.push("-map".into());
    args.push(format!("[{}]", VIDEO_OUT));
    args.push("-map".into());
    args.push(format!("[{}]", AUDIO_OUT));
    args.push("-c:v".into());
    args.push(settings.video_codec.clone());
    args.push("-preset".into());
    args.push(settings.preset.clone());
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push("-c:a".into());
    args.push(settings.audio_codec.clone());
    args.push("-ar".into());
    args.push(settings.audio_sample_rate.to_string());
    args.push("-movflags".into());
    args.push("+faststart".into());
    args.push("-progress".into());
    args.push("pipe:1".into());
    args.push("-nostats".into());
    args.push(output_path.to_string_lossy().to_string());
    args
}

/// Parse one `-progress pipe:1` line into elapsed output seconds.
///
/// Both `out_time_us` and `out_time_ms` carry microseconds.
fn parse_progress_line(line: &str) -> Option<f64> {
    let (key, value) = line.split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => {
            let micros: i64 = value.trim().parse().ok()?;
            (micros >= 0).then(|| micros as f64 / 1_000_000.0)
        }
        _ => None,
    }
}

fn progress_percent(done_secs: f64, total_secs: f64) -> u32 {
    if total_secs <= 0.0 {
        return 0;
    }
    ((done_secs / total_secs * 100.0).round() as u32).min(100)
}

fn discard_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetKind, BreakWindow, CompositionPolicy, MediaAsset, SourceForm};
    use crate::plan::build_plan;

    fn asset(kind: AssetKind, path: &str) -> MediaAsset {
        MediaAsset {
            kind,
            source_form: SourceForm::Path,
            resolved_path: PathBuf::from(path),
            size_bytes: 1,
        }
    }

    fn fixtures() -> (CompositionPlan, MediaProfile, ResolvedAssets) {
        let profile = MediaProfile {
            duration_seconds: 20.0,
            has_audio: true,
            width: 1280,
            height: 720,
            frame_rate_hint: Some(25.0),
        };
        let policy = CompositionPolicy {
            break_window: Some(BreakWindow {
                start: 10.0,
                duration: 5.0,
            }),
            ..CompositionPolicy::default()
        };
        let plan = build_plan(&profile, &policy, true, 0.04).unwrap();
        let assets = ResolvedAssets {
            video: asset(AssetKind::Video, "/work/video.mp4"),
            chart: asset(AssetKind::Image, "/work/chart.png"),
            audio: Some(asset(AssetKind::Audio, "/work/audio.mp3")),
        };
        (plan, profile, assets)
    }

    #[test]
    fn render_args_cover_codec_and_progress_flags() {
        let (plan, profile, assets) = fixtures();
        let args = build_render_args(
            &plan,
            &profile,
            &assets,
            &RenderSettings::default(),
            Path::new("/work/out.mp4"),
        );
        let joined = args.join(" ");

        assert!(joined.starts_with("-hide_banner -y"));
        assert!(joined.contains("-map [vout] -map [aout]"));
        assert!(joined.contains("-c:v libx264 -preset veryfast"));
        assert!(joined.contains("-c:a aac -ar 44100"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(joined.contains("-progress pipe:1 -nostats"));
        assert!(joined.ends_with("/work/out.mp4"));
    }

    #[test]
    fn progress_lines_parse_as_microseconds() {
        assert_eq!(parse_progress_line("out_time_us=5000000"), Some(5.0));
        assert_eq!(parse_progress_line("out_time_ms=2500000"), Some(2.5));
        assert_eq!(parse_progress_line("frame=120"), None);
        assert_eq!(parse_progress_line("out_time_us=bogus"), None);
        assert_eq!(parse_progress_line("progress=end"), None);
    }

    #[test]
    fn progress_percent_is_clamped() {
        assert_eq!(progress_percent(5.0, 20.0), 25);
        assert_eq!(progress_percent(25.0, 20.0), 100);
        assert_eq!(progress_percent(1.0, 0.0), 0);
    }

    #[test]
    fn spawn_failure_surfaces_as_render_error() {
        let (plan, profile, assets) = fixtures();
        let dir = tempfile::tempdir().unwrap();
        let logger = JobLogger::new(
            "spawn_fail",
            dir.path(),
            crate::logging::LogConfig::default(),
            None,
        )
        .unwrap();

        let renderer = Renderer::new(
            "/nonexistent/ffmpeg-binary",
            RenderSettings::default(),
            Duration::from_secs(5),
        );
        let err = renderer
            .render(
                &plan,
                &profile,
                &assets,
                dir.path(),
                &logger,
                &CancelHandle::new(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn(_)));
        assert_eq!(err.kind(), "RenderError");
    }

    /// Stand-in backend: emits machine progress for half and full output
    /// duration, then writes a non-empty file at the last argument.
    #[cfg(unix)]
    fn write_stub_backend(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("stub-encoder");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             echo \"out_time_us=10000000\"\n\
             echo \"out_time_us=20000000\"\n\
             for last in \"$@\"; do :; done\n\
             printf 'encoded' > \"$last\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn progress_reaches_the_caller_callback() {
        use std::sync::Mutex;

        let (plan, profile, assets) = fixtures();
        let dir = tempfile::tempdir().unwrap();
        let backend = write_stub_backend(dir.path());
        let logger = JobLogger::new(
            "progress_forwarding",
            dir.path(),
            crate::logging::LogConfig::default(),
            None,
        )
        .unwrap();

        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let on_progress: RenderProgress = Arc::new(move |pct| {
            seen_clone.lock().unwrap().push(pct);
        });

        let renderer = Renderer::new(
            backend.to_string_lossy().to_string(),
            RenderSettings::default(),
            Duration::from_secs(10),
        );
        let output = renderer
            .render(
                &plan,
                &profile,
                &assets,
                dir.path(),
                &logger,
                &CancelHandle::new(),
                Some(on_progress),
            )
            .unwrap();

        assert!(output.output_path.exists());
        // 10s and 20s of a 25s plan: 40% and 80%.
        assert_eq!(*seen.lock().unwrap(), vec![40, 80]);
    }

    #[test]
    fn error_kinds_distinguish_timeout() {
        let timeout = RenderError::Timeout {
            secs: 300,
            command: "ffmpeg".into(),
        };
        assert_eq!(timeout.kind(), "RenderTimeout");
        assert_eq!(timeout.command(), Some("ffmpeg"));
        assert_eq!(RenderError::Cancelled.kind(), "RenderCancelled");
    }
}
