//! Media Prober: stream/duration inspection via `ffprobe -of json`.
//!
//! Probing never guesses: a missing duration or video stream fails the
//! request, while a missing audio stream is a legitimate profile value.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

use crate::models::MediaProfile;

/// Errors from probing a media file.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to run ffprobe: {0}")]
    Spawn(String),

    #[error("ffprobe exited with code {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    #[error("ffprobe timed out after {0}s")]
    Timeout(u64),

    #[error("failed to parse ffprobe output: {0}")]
    Parse(String),

    #[error("no video stream in source")]
    NoVideoStream,

    #[error("container reports no duration")]
    MissingDuration,

    #[error("invalid video dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Probes media files with a bounded ffprobe invocation.
pub struct Prober {
    ffprobe_path: String,
    timeout: Duration,
}

impl Prober {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    /// Probe a video file and build its [`MediaProfile`].
    pub fn probe(&self, path: &Path) -> ProbeResult<MediaProfile> {
        if !path.exists() {
            return Err(ProbeError::FileNotFound(path.to_path_buf()));
        }

        tracing::debug!("Probing {}", path.display());

        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(["-v", "error", "-show_streams", "-show_format", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let (exit_code, stdout, stderr) = run_bounded(cmd, self.timeout)?;

        if exit_code != 0 {
            return Err(ProbeError::CommandFailed {
                exit_code,
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            });
        }

        let json: Value =
            serde_json::from_slice(&stdout).map_err(|e| ProbeError::Parse(e.to_string()))?;
        parse_profile(&json)
    }
}

/// Run a command to completion with a deadline, collecting stdout/stderr.
///
/// The pipes are drained on separate threads so a chatty child cannot
/// deadlock against a full pipe buffer.
fn run_bounded(mut cmd: Command, timeout: Duration) -> ProbeResult<(i32, Vec<u8>, Vec<u8>)> {
    let mut child = cmd.spawn().map_err(|e| ProbeError::Spawn(e.to_string()))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ProbeError::Spawn("failed to capture stdout".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ProbeError::Spawn("failed to capture stderr".to_string()))?;

    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf);
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProbeError::Timeout(timeout.as_secs()));
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => return Err(ProbeError::Spawn(e.to_string())),
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok((status.code().unwrap_or(-1), stdout, stderr))
}

/// Parse ffprobe JSON output into a [`MediaProfile`].
///
/// Kept pure so it can be tested against fixture documents.
pub fn parse_profile(json: &Value) -> ProbeResult<MediaProfile> {
    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .ok_or_else(|| ProbeError::Parse("missing streams array".to_string()))?;

    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
        .ok_or(ProbeError::NoVideoStream)?;

    let has_audio = streams
        .iter()
        .any(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"));

    let width = video.get("width").and_then(|v| v.as_i64()).unwrap_or(0);
    let height = video.get("height").and_then(|v| v.as_i64()).unwrap_or(0);
    if width <= 0 || height <= 0 {
        return Err(ProbeError::InvalidDimensions { width, height });
    }

    // Duration: prefer the container, fall back to the video stream.
    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| {
            video
                .get("duration")
                .and_then(|d| d.as_str())
                .and_then(|s| s.parse::<f64>().ok())
        })
        .ok_or(ProbeError::MissingDuration)?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(ProbeError::Parse(format!("invalid duration {}", duration)));
    }

    let frame_rate_hint = video
        .get("r_frame_rate")
        .and_then(|r| r.as_str())
        .and_then(parse_frame_rate);

    Ok(MediaProfile {
        duration_seconds: duration,
        has_audio,
        width: width as u32,
        height: height as u32,
        frame_rate_hint,
    })
}

/// Parse a frame rate string like "24000/1001" into a float.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let parts: Vec<&str> = rate.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok().filter(|f| *f > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(streams: Value, duration: Option<&str>) -> Value {
        let mut doc = json!({ "streams": streams });
        if let Some(d) = duration {
            doc["format"] = json!({ "duration": d });
        }
        doc
    }

    #[test]
    fn parses_video_with_audio() {
        let doc = fixture(
            json!([
                {"codec_type": "video", "width": 1280, "height": 720, "r_frame_rate": "30000/1001"},
                {"codec_type": "audio", "sample_rate": "44100"}
            ]),
            Some("20.480000"),
        );

        let profile = parse_profile(&doc).unwrap();
        assert!((profile.duration_seconds - 20.48).abs() < 1e-9);
        assert!(profile.has_audio);
        assert_eq!(profile.width, 1280);
        assert_eq!(profile.height, 720);
        assert!((profile.frame_rate_hint.unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn missing_audio_stream_is_not_an_error() {
        let doc = fixture(
            json!([{"codec_type": "video", "width": 640, "height": 360}]),
            Some("8.0"),
        );

        let profile = parse_profile(&doc).unwrap();
        assert!(!profile.has_audio);
        assert!(profile.frame_rate_hint.is_none());
    }

    #[test]
    fn missing_video_stream_fails() {
        let doc = fixture(json!([{"codec_type": "audio"}]), Some("8.0"));
        assert!(matches!(parse_profile(&doc), Err(ProbeError::NoVideoStream)));
    }

    #[test]
    fn missing_duration_fails_rather_than_defaulting() {
        let doc = fixture(
            json!([{"codec_type": "video", "width": 640, "height": 360}]),
            None,
        );
        assert!(matches!(
            parse_profile(&doc),
            Err(ProbeError::MissingDuration)
        ));
    }

    #[test]
    fn zero_dimensions_fail() {
        let doc = fixture(
            json!([{"codec_type": "video", "width": 0, "height": 360}]),
            Some("8.0"),
        );
        assert!(matches!(
            parse_profile(&doc),
            Err(ProbeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn frame_rate_parsing() {
        assert!((parse_frame_rate("25/1").unwrap() - 25.0).abs() < 1e-9);
        assert!((parse_frame_rate("23.976").unwrap() - 23.976).abs() < 1e-9);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("garbage").is_none());
    }

    #[test]
    fn probe_nonexistent_file() {
        let prober = Prober::new("ffprobe", Duration::from_secs(5));
        let result = prober.probe(Path::new("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
    }
}
