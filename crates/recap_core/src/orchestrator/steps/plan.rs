//! Plan step: build and validate the composition plan.

use crate::models::JobStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::plan::build_plan;

pub struct PlanStep;

impl PipelineStep for PlanStep {
    fn name(&self) -> &str {
        "Plan"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_profile() {
            return Err(StepError::invalid_input("media profile not available"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        state.status = JobStatus::Planning;

        let profile = state
            .profile
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("media profile not available"))?;

        let plan = build_plan(
            profile,
            &ctx.request.policy,
            ctx.has_background_audio(),
            ctx.settings.render.duration_tolerance_secs(),
        )?;

        ctx.logger.info(&format!(
            "Plan: {} video / {} audio segments, output {:.3}s, mode={}",
            plan.video_segments.len(),
            plan.audio_segments.len(),
            plan.video_total_duration(),
            if plan.has_still_segment() {
                "break"
            } else {
                "overlay"
            }
        ));

        state.plan = Some(plan);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("plan not recorded"))?;
        if plan.video_concat.is_empty() || plan.audio_concat.is_empty() {
            return Err(StepError::invalid_output("plan has an empty stream"));
        }
        Ok(())
    }
}
