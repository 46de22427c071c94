//! Probed media stream information.

use serde::{Deserialize, Serialize};

/// Prober output for the source video.
///
/// `duration_seconds` is authoritative for all downstream timing decisions.
/// A missing audio stream is a legitimate profile value, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProfile {
    /// Container duration in seconds.
    pub duration_seconds: f64,
    /// Whether the source carries an audio stream.
    pub has_audio: bool,
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Average frame rate, when the container reports one.
    pub frame_rate_hint: Option<f64>,
}

impl MediaProfile {
    /// Frame rate to use when normalizing generated segments for concat.
    pub fn frame_rate_or_default(&self) -> f64 {
        self.frame_rate_hint.unwrap_or(25.0)
    }
}
