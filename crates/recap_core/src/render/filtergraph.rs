//! Translation of a [`CompositionPlan`] into ffmpeg input arguments and a
//! `filter_complex` expression.
//!
//! Pure string construction, no process involvement, so every plan shape
//! can be asserted against directly in tests.

use crate::config::RenderSettings;
use crate::models::{AudioSegment, CompositionPlan, MediaProfile, ResolvedAssets, VideoSegment};

/// Stream index of the source video input.
const VIDEO_INPUT: usize = 0;
/// Stream index of the chart image input.
const CHART_INPUT: usize = 1;
/// Stream index of the background audio input, when present.
const AUDIO_INPUT: usize = 2;

/// Output pad labels consumed by `-map`.
pub const VIDEO_OUT: &str = "vout";
pub const AUDIO_OUT: &str = "aout";

/// Build the `-i` argument list for the planned inputs.
///
/// Input order is fixed: source video, chart image, then background audio
/// when the plan uses one. The chart is looped when a still segment needs
/// it to persist past its intrinsic single frame.
pub fn build_input_args(plan: &CompositionPlan, assets: &ResolvedAssets) -> Vec<String> {
    let mut args = Vec::new();

    args.push("-i".to_string());
    args.push(assets.video.resolved_path.to_string_lossy().to_string());

    if plan.has_still_segment() {
        args.push("-loop".to_string());
        args.push("1".to_string());
    }
    args.push("-i".to_string());
    args.push(assets.chart.resolved_path.to_string_lossy().to_string());

    if plan.uses_background {
        if let Some(ref audio) = assets.audio {
            args.push("-i".to_string());
            args.push(audio.resolved_path.to_string_lossy().to_string());
        }
    }

    args
}

/// Build the complete `filter_complex` expression for a plan.
///
/// Every video chain normalizes to `yuv420p` and zero-based PTS; every
/// concatenated audio chain normalizes to stereo at the configured sample
/// rate so the concat filter never sees mismatched formats.
pub fn build_filter_complex(
    plan: &CompositionPlan,
    profile: &MediaProfile,
    settings: &RenderSettings,
) -> String {
    let mut chains: Vec<String> = Vec::new();

    for segment in &plan.video_segments {
        chains.push(video_chain(segment, profile));
    }
    for segment in &plan.audio_segments {
        let terminal = plan.audio_concat.iter().any(|l| l == segment.label());
        chains.push(audio_chain(segment, terminal, settings));
    }

    // Concat stages are emitted even for a single segment so the output
    // pads always exist under the same names.
    let video_pads: String = plan
        .video_concat
        .iter()
        .map(|l| format!("[{}]", l))
        .collect();
    chains.push(format!(
        "{}concat=n={}:v=1:a=0[{}]",
        video_pads,
        plan.video_concat.len(),
        VIDEO_OUT
    ));

    let audio_pads: String = plan
        .audio_concat
        .iter()
        .map(|l| format!("[{}]", l))
        .collect();
    chains.push(format!(
        "{}concat=n={}:v=0:a=1[{}]",
        audio_pads,
        plan.audio_concat.len(),
        AUDIO_OUT
    ));

    chains.join(";")
}

fn video_chain(segment: &VideoSegment, profile: &MediaProfile) -> String {
    match segment {
        VideoSegment::SourceSpan {
            label,
            start,
            end,
            overlay,
        } => match overlay {
            Some(window) => {
                // Chart scaled to a third of the frame, pinned top-left,
                // visible only inside the window.
                let overlay_width = (profile.width / 3).max(1);
                format!(
                    "[{chart}:v]scale={ow}:-1[ovl];\
                     [{video}:v][ovl]overlay=10:10:enable='between(t,{s},{e})',\
                     trim=start={ts}:end={te},setpts=PTS-STARTPTS,format=yuv420p[{label}]",
                    chart = CHART_INPUT,
                    video = VIDEO_INPUT,
                    ow = overlay_width,
                    s = fmt_time(window.start),
                    e = fmt_time(window.end),
                    ts = fmt_time(*start),
                    te = fmt_time(*end),
                    label = label
                )
            }
            None => format!(
                "[{video}:v]trim=start={s}:end={e},setpts=PTS-STARTPTS,format=yuv420p[{label}]",
                video = VIDEO_INPUT,
                s = fmt_time(*start),
                e = fmt_time(*end),
                label = label
            ),
        },
        VideoSegment::StillLoop {
            label,
            duration,
            width,
            height,
        } => {
            let fps = profile.frame_rate_or_default();
            format!(
                "[{chart}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps},trim=duration={d},\
                 setpts=PTS-STARTPTS,format=yuv420p[{label}]",
                chart = CHART_INPUT,
                w = width,
                h = height,
                fps = fmt_time(fps),
                d = fmt_time(*duration),
                label = label
            )
        }
    }
}

fn audio_chain(segment: &AudioSegment, terminal: bool, settings: &RenderSettings) -> String {
    let normalize = format!(
        ",aformat=sample_rates={}:channel_layouts=stereo",
        settings.audio_sample_rate
    );
    let suffix = if terminal { normalize.as_str() } else { "" };

    match segment {
        AudioSegment::VoiceSpan { label, start, end } => format!(
            "[{video}:a]atrim=start={s}:end={e},asetpts=PTS-STARTPTS{suffix}[{label}]",
            video = VIDEO_INPUT,
            s = fmt_time(*start),
            e = fmt_time(*end),
            suffix = suffix,
            label = label
        ),
        AudioSegment::BackgroundSpan {
            label,
            start,
            end,
            gain,
        } => {
            // apad guarantees the span fills its slot even when the music
            // file runs out before the requested end.
            let span = end - start;
            let volume = if (*gain - 1.0).abs() > f64::EPSILON {
                format!(",volume={}", fmt_time(*gain))
            } else {
                String::new()
            };
            format!(
                "[{audio}:a]atrim=start={s}:end={e},asetpts=PTS-STARTPTS,\
                 apad=whole_dur={d}{volume}{suffix}[{label}]",
                audio = AUDIO_INPUT,
                s = fmt_time(*start),
                e = fmt_time(*end),
                d = fmt_time(span),
                volume = volume,
                suffix = suffix,
                label = label
            )
        }
        AudioSegment::Silence { label, duration } => format!(
            "anullsrc=channel_layout=stereo:sample_rate={sr},\
             atrim=duration={d},asetpts=PTS-STARTPTS{suffix}[{label}]",
            sr = settings.audio_sample_rate,
            d = fmt_time(*duration),
            suffix = suffix,
            label = label
        ),
        AudioSegment::Mix {
            label,
            voice,
            music,
            weights,
        } => format!(
            "[{voice}][{music}]amix=inputs=2:duration=first:normalize=0:\
             weights='{v} {m}'{suffix}[{label}]",
            voice = voice,
            music = music,
            v = fmt_time(weights.voice),
            m = fmt_time(weights.music),
            suffix = suffix,
            label = label
        ),
    }
}

/// Format a seconds/ratio value without trailing zeros.
fn fmt_time(value: f64) -> String {
    let s = format!("{:.3}", value);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
