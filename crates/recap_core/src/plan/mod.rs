//! Filter Graph Planner: turns a media profile plus a composition policy
//! into a validated [`CompositionPlan`].
//!
//! One policy-driven builder replaces the overlay-only / splice-with-music
//! / splice-without-music pipeline variants. Duration mismatches between
//! the concatenated streams are caught here, before rendering, never
//! discovered as a muxing error.

use thiserror::Error;

use crate::models::{
    AudioSegment, BreakWindow, CompositionPlan, CompositionPolicy, MediaProfile, VideoSegment,
};

/// Errors from plan construction or validation, naming the violated
/// invariant.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("source video ({actual:.3}s) is shorter than break start ({required:.3}s)")]
    SourceShorterThanBreak { actual: f64, required: f64 },

    #[error("invalid overlay window: start {start:.3} must be >= 0 and < end {end:.3}")]
    InvalidOverlayWindow { start: f64, end: f64 },

    #[error("invalid break window: start {start:.3} and duration {duration:.3} must be positive")]
    InvalidBreakWindow { start: f64, duration: f64 },

    #[error(
        "planned video ({video:.3}s) and audio ({audio:.3}s) durations \
         differ by more than {tolerance:.3}s"
    )]
    DurationMismatch {
        video: f64,
        audio: f64,
        tolerance: f64,
    },

    #[error("segment '{0}' is referenced before it is defined")]
    UndefinedSegment(String),

    #[error("duplicate segment label '{0}'")]
    DuplicateLabel(String),
}

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanningError>;

/// Build and validate a composition plan.
///
/// `has_background_audio` reflects whether the caller supplied a background
/// track; the source's own audio presence comes from the profile. The break
/// window, when present, takes precedence over the overlay window.
pub fn build_plan(
    profile: &MediaProfile,
    policy: &CompositionPolicy,
    has_background_audio: bool,
    tolerance_secs: f64,
) -> PlanResult<CompositionPlan> {
    let plan = match policy.break_window {
        Some(bw) => plan_break(profile, policy, bw, has_background_audio)?,
        None => plan_overlay(profile, policy, has_background_audio)?,
    };

    validate_plan(&plan, tolerance_secs)?;
    Ok(plan)
}

/// Splice mode: source plays to `start`, the chart holds full-frame for
/// `duration`, then the source resumes. Output length is source + break.
fn plan_break(
    profile: &MediaProfile,
    policy: &CompositionPolicy,
    bw: BreakWindow,
    has_background: bool,
) -> PlanResult<CompositionPlan> {
    if bw.start <= 0.0 || bw.duration <= 0.0 {
        return Err(PlanningError::InvalidBreakWindow {
            start: bw.start,
            duration: bw.duration,
        });
    }

    let dur = profile.duration_seconds;
    if dur < bw.start {
        return Err(PlanningError::SourceShorterThanBreak {
            actual: dur,
            required: bw.start,
        });
    }

    // A break landing exactly at the end of the source would leave a
    // zero-frame trailing span; concat chokes on empty inputs, so the tail
    // is omitted entirely.
    let has_tail = dur > bw.start;

    let mut video_segments = vec![
        VideoSegment::SourceSpan {
            label: "v0".into(),
            start: 0.0,
            end: bw.start,
            overlay: None,
        },
        VideoSegment::StillLoop {
            label: "v1".into(),
            duration: bw.duration,
            width: profile.width,
            height: profile.height,
        },
    ];
    let mut video_concat: Vec<String> = vec!["v0".into(), "v1".into()];
    if has_tail {
        video_segments.push(VideoSegment::SourceSpan {
            label: "v2".into(),
            start: bw.start,
            end: dur,
            overlay: None,
        });
        video_concat.push("v2".into());
    }

    let weights = policy.mix_weights;
    let mut audio_segments = Vec::new();
    let mut audio_concat: Vec<String> = Vec::new();

    if profile.has_audio {
        // Three segments along the output timeline: voice before the break,
        // the break itself, voice after. The background track keeps playing
        // through the break rather than pausing.
        if has_background {
            audio_segments.push(AudioSegment::VoiceSpan {
                label: "va0".into(),
                start: 0.0,
                end: bw.start,
            });
            audio_segments.push(AudioSegment::BackgroundSpan {
                label: "ba0".into(),
                start: 0.0,
                end: bw.start,
                gain: 1.0,
            });
            audio_segments.push(AudioSegment::Mix {
                label: "a0".into(),
                voice: "va0".into(),
                music: "ba0".into(),
                weights,
            });

            audio_segments.push(AudioSegment::BackgroundSpan {
                label: "a1".into(),
                start: bw.start,
                end: bw.start + bw.duration,
                gain: weights.music,
            });

            if has_tail {
                audio_segments.push(AudioSegment::VoiceSpan {
                    label: "va2".into(),
                    start: bw.start,
                    end: dur,
                });
                audio_segments.push(AudioSegment::BackgroundSpan {
                    label: "ba2".into(),
                    start: bw.start + bw.duration,
                    end: dur + bw.duration,
                    gain: 1.0,
                });
                audio_segments.push(AudioSegment::Mix {
                    label: "a2".into(),
                    voice: "va2".into(),
                    music: "ba2".into(),
                    weights,
                });
            }
        } else {
            audio_segments.push(AudioSegment::VoiceSpan {
                label: "a0".into(),
                start: 0.0,
                end: bw.start,
            });
            audio_segments.push(AudioSegment::Silence {
                label: "a1".into(),
                duration: bw.duration,
            });
            if has_tail {
                audio_segments.push(AudioSegment::VoiceSpan {
                    label: "a2".into(),
                    start: bw.start,
                    end: dur,
                });
            }
        }
        audio_concat = vec!["a0".into(), "a1".into()];
        if has_tail {
            audio_concat.push("a2".into());
        }
    } else {
        // No voice to duck under: one track spans the whole output.
        let total = dur + bw.duration;
        if has_background {
            audio_segments.push(AudioSegment::BackgroundSpan {
                label: "a0".into(),
                start: 0.0,
                end: total,
                gain: 1.0,
            });
        } else {
            audio_segments.push(AudioSegment::Silence {
                label: "a0".into(),
                duration: total,
            });
        }
        audio_concat.push("a0".into());
    }

    Ok(CompositionPlan {
        video_segments,
        audio_segments,
        video_concat,
        audio_concat,
        uses_chart: true,
        uses_background: has_background,
    })
}

/// Overlay mode: a single passthrough video segment with the chart
/// composited on top inside the overlay window. Timeline length unchanged.
fn plan_overlay(
    profile: &MediaProfile,
    policy: &CompositionPolicy,
    has_background: bool,
) -> PlanResult<CompositionPlan> {
    let ow = policy.overlay_window;
    if ow.start < 0.0 || ow.end <= ow.start {
        return Err(PlanningError::InvalidOverlayWindow {
            start: ow.start,
            end: ow.end,
        });
    }

    let dur = profile.duration_seconds;

    let video_segments = vec![VideoSegment::SourceSpan {
        label: "v0".into(),
        start: 0.0,
        end: dur,
        overlay: Some(ow),
    }];
    let video_concat = vec!["v0".into()];

    let weights = policy.mix_weights;
    let mut audio_segments = Vec::new();

    match (profile.has_audio, has_background) {
        (true, true) => {
            audio_segments.push(AudioSegment::VoiceSpan {
                label: "va0".into(),
                start: 0.0,
                end: dur,
            });
            audio_segments.push(AudioSegment::BackgroundSpan {
                label: "ba0".into(),
                start: 0.0,
                end: dur,
                gain: 1.0,
            });
            audio_segments.push(AudioSegment::Mix {
                label: "a0".into(),
                voice: "va0".into(),
                music: "ba0".into(),
                weights,
            });
        }
        (true, false) => {
            audio_segments.push(AudioSegment::VoiceSpan {
                label: "a0".into(),
                start: 0.0,
                end: dur,
            });
        }
        (false, true) => {
            audio_segments.push(AudioSegment::BackgroundSpan {
                label: "a0".into(),
                start: 0.0,
                end: dur,
                gain: 1.0,
            });
        }
        (false, false) => {
            audio_segments.push(AudioSegment::Silence {
                label: "a0".into(),
                duration: dur,
            });
        }
    }

    Ok(CompositionPlan {
        video_segments,
        audio_segments,
        video_concat,
        audio_concat: vec!["a0".into()],
        uses_chart: true,
        uses_background: has_background,
    })
}

/// Validate plan invariants: unique labels, strict dependency order, every
/// concatenated label defined, and matching stream totals.
pub fn validate_plan(plan: &CompositionPlan, tolerance_secs: f64) -> PlanResult<()> {
    let mut seen = std::collections::HashSet::new();
    for seg in &plan.video_segments {
        if !seen.insert(format!("video:{}", seg.label())) {
            return Err(PlanningError::DuplicateLabel(seg.label().to_string()));
        }
    }

    let mut audio_defined = std::collections::HashSet::new();
    for seg in &plan.audio_segments {
        if let AudioSegment::Mix { voice, music, .. } = seg {
            // A mix may only consume segments defined before it.
            for input in [voice, music] {
                if !audio_defined.contains(input.as_str()) {
                    return Err(PlanningError::UndefinedSegment(input.clone()));
                }
            }
        }
        if !audio_defined.insert(seg.label().to_string()) {
            return Err(PlanningError::DuplicateLabel(seg.label().to_string()));
        }
    }

    for label in &plan.video_concat {
        if !plan.video_segments.iter().any(|s| s.label() == label) {
            return Err(PlanningError::UndefinedSegment(label.clone()));
        }
    }
    for label in &plan.audio_concat {
        if !audio_defined.contains(label.as_str()) {
            return Err(PlanningError::UndefinedSegment(label.clone()));
        }
    }

    let video_total = plan.video_total_duration();
    let audio_total = plan.audio_total_duration();
    if (video_total - audio_total).abs() > tolerance_secs {
        return Err(PlanningError::DurationMismatch {
            video: video_total,
            audio: audio_total,
            tolerance: tolerance_secs,
        });
    }

    Ok(())
}
