//! Composition policy: the caller-facing knobs that drive planning.
//!
//! One policy struct replaces the overlay-only / splice-with-music /
//! splice-without-music pipeline variants: the differences are
//! configuration, not separate code paths.

use serde::{Deserialize, Serialize};

/// Time range during which the chart image is shown over the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayWindow {
    /// Window start in seconds.
    pub start: f64,
    /// Window end in seconds.
    pub end: f64,
}

impl Default for OverlayWindow {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 5.0,
        }
    }
}

/// Splice window: the source video pauses at `start` while the chart plays
/// full-frame for `duration` seconds, then the source resumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakWindow {
    /// Point in the source timeline where the splice is inserted, seconds.
    pub start: f64,
    /// Length of the inserted still segment, seconds.
    pub duration: f64,
}

/// Relative mix levels when both the voice track and background audio are
/// present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioMixWeights {
    pub voice: f64,
    pub music: f64,
}

impl Default for AudioMixWeights {
    fn default() -> Self {
        Self {
            voice: 1.0,
            music: 0.25,
        }
    }
}

/// Composition policy for one request.
///
/// When both a break window and an overlay window are configured, the break
/// window wins: splice semantics subsume overlay semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionPolicy {
    /// Overlay window, used when no break window is given.
    #[serde(default)]
    pub overlay_window: OverlayWindow,
    /// Optional splice window; takes precedence over the overlay window.
    #[serde(default)]
    pub break_window: Option<BreakWindow>,
    /// Mix levels for voice vs. background audio.
    #[serde(default)]
    pub mix_weights: AudioMixWeights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let policy = CompositionPolicy::default();
        assert!((policy.overlay_window.start - 0.0).abs() < f64::EPSILON);
        assert!((policy.overlay_window.end - 5.0).abs() < f64::EPSILON);
        assert!(policy.break_window.is_none());
        assert!((policy.mix_weights.voice - 1.0).abs() < f64::EPSILON);
        assert!((policy.mix_weights.music - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn policy_deserializes_with_partial_fields() {
        let policy: CompositionPolicy =
            serde_json::from_str(r#"{"break_window":{"start":10.0,"duration":5.0}}"#).unwrap();
        let bw = policy.break_window.unwrap();
        assert!((bw.start - 10.0).abs() < f64::EPSILON);
        assert!((bw.duration - 5.0).abs() < f64::EPSILON);
        // Untouched sections keep their defaults.
        assert!((policy.mix_weights.music - 0.25).abs() < f64::EPSILON);
    }
}
