//! Probe step: inspect the source video's streams and duration.

use std::time::Duration;

use crate::models::JobStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::probe::Prober;

pub struct ProbeStep;

impl PipelineStep for ProbeStep {
    fn name(&self) -> &str {
        "Probe"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_assets() {
            return Err(StepError::invalid_input("assets not resolved"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        state.status = JobStatus::Probing;

        let assets = state
            .assets
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("assets not resolved"))?;

        let prober = Prober::new(
            &ctx.settings.tools.ffprobe_path,
            Duration::from_secs(ctx.settings.timeouts.probe_secs),
        );
        let profile = prober.probe(&assets.video.resolved_path)?;

        ctx.logger.info(&format!(
            "Source: {:.3}s {}x{} audio={} fps={}",
            profile.duration_seconds,
            profile.width,
            profile.height,
            profile.has_audio,
            profile
                .frame_rate_hint
                .map_or("unknown".to_string(), |f| format!("{:.3}", f))
        ));

        state.profile = Some(profile);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let profile = state
            .profile
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("profile not recorded"))?;
        if profile.duration_seconds <= 0.0 {
            return Err(StepError::invalid_output("non-positive source duration"));
        }
        Ok(())
    }
}
