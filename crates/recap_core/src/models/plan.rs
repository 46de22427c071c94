//! Composition plan: an ordered, immutable description of how inputs are
//! combined into one output video.
//!
//! The plan is pure data. Building it from a policy lives in [`crate::plan`];
//! translating it into an ffmpeg filter graph lives in [`crate::render`].

use serde::{Deserialize, Serialize};

use super::policy::{AudioMixWeights, OverlayWindow};

/// One named video segment of the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VideoSegment {
    /// A span of the source video, optionally with the chart image
    /// composited on top inside a time window (timeline length unchanged).
    SourceSpan {
        label: String,
        /// Trim start in source seconds.
        start: f64,
        /// Trim end in source seconds.
        end: f64,
        /// Time-gated overlay, in segment-local seconds.
        overlay: Option<OverlayWindow>,
    },
    /// The chart image looped as a still, scaled/padded to the source
    /// dimensions.
    StillLoop {
        label: String,
        duration: f64,
        width: u32,
        height: u32,
    },
}

impl VideoSegment {
    pub fn label(&self) -> &str {
        match self {
            VideoSegment::SourceSpan { label, .. } => label,
            VideoSegment::StillLoop { label, .. } => label,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            VideoSegment::SourceSpan { start, end, .. } => end - start,
            VideoSegment::StillLoop { duration, .. } => *duration,
        }
    }
}

/// One named audio segment of the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioSegment {
    /// A slice of the source video's own audio track.
    VoiceSpan { label: String, start: f64, end: f64 },
    /// A slice of the background audio track, padded with silence if the
    /// track is shorter than the window. `start`/`end` are positions in the
    /// background track's own timeline.
    BackgroundSpan {
        label: String,
        start: f64,
        end: f64,
        gain: f64,
    },
    /// Synthesized silence.
    Silence { label: String, duration: f64 },
    /// Weighted mix of two earlier segments. Output length follows the
    /// `voice` segment.
    Mix {
        label: String,
        voice: String,
        music: String,
        weights: AudioMixWeights,
    },
}

impl AudioSegment {
    pub fn label(&self) -> &str {
        match self {
            AudioSegment::VoiceSpan { label, .. } => label,
            AudioSegment::BackgroundSpan { label, .. } => label,
            AudioSegment::Silence { label, .. } => label,
            AudioSegment::Mix { label, .. } => label,
        }
    }
}

/// The full composition plan: segment definitions plus the two final
/// concatenation steps. Segment definition order is the dependency order;
/// a mix may only reference segments defined before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionPlan {
    pub video_segments: Vec<VideoSegment>,
    pub audio_segments: Vec<AudioSegment>,
    /// Labels of video segments to concatenate, in output order.
    pub video_concat: Vec<String>,
    /// Labels of audio segments to concatenate, in output order.
    pub audio_concat: Vec<String>,
    /// Whether the chart image participates (overlay or still loop).
    pub uses_chart: bool,
    /// Whether the background audio track participates.
    pub uses_background: bool,
}

impl CompositionPlan {
    /// Look up an audio segment by label.
    pub fn audio_segment(&self, label: &str) -> Option<&AudioSegment> {
        self.audio_segments.iter().find(|s| s.label() == label)
    }

    /// Duration of an audio segment; a mix inherits its voice input's length.
    pub fn audio_segment_duration(&self, segment: &AudioSegment) -> Option<f64> {
        match segment {
            AudioSegment::VoiceSpan { start, end, .. } => Some(end - start),
            AudioSegment::BackgroundSpan { start, end, .. } => Some(end - start),
            AudioSegment::Silence { duration, .. } => Some(*duration),
            AudioSegment::Mix { voice, .. } => {
                let inner = self.audio_segment(voice)?;
                self.audio_segment_duration(inner)
            }
        }
    }

    /// Total duration of the concatenated video stream.
    pub fn video_total_duration(&self) -> f64 {
        self.video_concat
            .iter()
            .filter_map(|label| {
                self.video_segments
                    .iter()
                    .find(|s| s.label() == label)
                    .map(|s| s.duration())
            })
            .sum()
    }

    /// Total duration of the concatenated audio stream.
    pub fn audio_total_duration(&self) -> f64 {
        self.audio_concat
            .iter()
            .filter_map(|label| {
                self.audio_segment(label)
                    .and_then(|s| self.audio_segment_duration(s))
            })
            .sum()
    }

    /// Whether any video segment is a looped still (splice mode).
    pub fn has_still_segment(&self) -> bool {
        self.video_segments
            .iter()
            .any(|s| matches!(s, VideoSegment::StillLoop { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_segment_plan() -> CompositionPlan {
        CompositionPlan {
            video_segments: vec![
                VideoSegment::SourceSpan {
                    label: "v0".into(),
                    start: 0.0,
                    end: 10.0,
                    overlay: None,
                },
                VideoSegment::StillLoop {
                    label: "v1".into(),
                    duration: 5.0,
                    width: 1280,
                    height: 720,
                },
                VideoSegment::SourceSpan {
                    label: "v2".into(),
                    start: 10.0,
                    end: 20.0,
                    overlay: None,
                },
            ],
            audio_segments: vec![
                AudioSegment::VoiceSpan {
                    label: "a0".into(),
                    start: 0.0,
                    end: 10.0,
                },
                AudioSegment::Silence {
                    label: "a1".into(),
                    duration: 5.0,
                },
                AudioSegment::VoiceSpan {
                    label: "a2".into(),
                    start: 10.0,
                    end: 20.0,
                },
            ],
            video_concat: vec!["v0".into(), "v1".into(), "v2".into()],
            audio_concat: vec!["a0".into(), "a1".into(), "a2".into()],
            uses_chart: true,
            uses_background: false,
        }
    }

    #[test]
    fn totals_sum_concatenated_segments() {
        let plan = three_segment_plan();
        assert!((plan.video_total_duration() - 25.0).abs() < 1e-9);
        assert!((plan.audio_total_duration() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn mix_duration_follows_voice_input() {
        let plan = CompositionPlan {
            video_segments: vec![VideoSegment::SourceSpan {
                label: "v0".into(),
                start: 0.0,
                end: 8.0,
                overlay: None,
            }],
            audio_segments: vec![
                AudioSegment::VoiceSpan {
                    label: "va".into(),
                    start: 0.0,
                    end: 8.0,
                },
                AudioSegment::BackgroundSpan {
                    label: "ba".into(),
                    start: 0.0,
                    end: 8.0,
                    gain: 1.0,
                },
                AudioSegment::Mix {
                    label: "a0".into(),
                    voice: "va".into(),
                    music: "ba".into(),
                    weights: AudioMixWeights::default(),
                },
            ],
            video_concat: vec!["v0".into()],
            audio_concat: vec!["a0".into()],
            uses_chart: false,
            uses_background: true,
        };

        assert!((plan.audio_total_duration() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn still_segment_detection() {
        assert!(three_segment_plan().has_still_segment());
    }
}
