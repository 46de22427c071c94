//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and every field carries a serde
//! default, so partial config files load cleanly.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External tool executables.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Stage timeouts.
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Render/encode settings.
    #[serde(default)]
    pub render: RenderSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for temp and log storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder under which per-job work directories are created.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// External tool locations (resolved via PATH when left as bare names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
        }
    }
}

/// Per-stage deadlines. No operation is allowed to hang unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Remote asset fetch timeout, seconds.
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,

    /// ffprobe timeout, seconds.
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,

    /// ffmpeg render timeout, seconds.
    #[serde(default = "default_render_secs")]
    pub render_secs: u64,
}

fn default_fetch_secs() -> u64 {
    30
}

fn default_probe_secs() -> u64 {
    30
}

fn default_render_secs() -> u64 {
    300
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            fetch_secs: default_fetch_secs(),
            probe_secs: default_probe_secs(),
            render_secs: default_render_secs(),
        }
    }
}

/// Render/encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Allowed difference between planned video and audio totals, ms.
    #[serde(default = "default_tolerance_ms")]
    pub duration_tolerance_ms: u64,

    /// Delay before removing the work directory, ms. Gives the backend
    /// process time to release its handles.
    #[serde(default = "default_grace_ms")]
    pub cleanup_grace_ms: u64,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Sample rate applied to every audio segment so concat inputs match.
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,
}

fn default_tolerance_ms() -> u64 {
    40
}

fn default_grace_ms() -> u64 {
    250
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            duration_tolerance_ms: default_tolerance_ms(),
            cleanup_grace_ms: default_grace_ms(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            audio_codec: default_audio_codec(),
            audio_sample_rate: default_sample_rate(),
        }
    }
}

impl RenderSettings {
    /// Duration tolerance in seconds.
    pub fn duration_tolerance_secs(&self) -> f64 {
        self.duration_tolerance_ms as f64 / 1000.0
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (filter progress, keep stderr in tail only).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of backend output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    40
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: default_true(),
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_timestamps: default_true(),
        }
    }
}
