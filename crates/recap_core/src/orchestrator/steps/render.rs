//! Render step: execute the planned filter graph through ffmpeg.

use std::sync::Arc;
use std::time::Duration;

use crate::models::JobStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::render::{RenderProgress, Renderer};

pub struct RenderStep;

impl PipelineStep for RenderStep {
    fn name(&self) -> &str {
        "Render"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_plan() {
            return Err(StepError::invalid_input("no composition plan"));
        }
        if !state.has_assets() {
            return Err(StepError::invalid_input("assets not resolved"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        state.status = JobStatus::Rendering;

        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("no composition plan"))?;
        let profile = state
            .profile
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("media profile not available"))?;
        let assets = state
            .assets
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("assets not resolved"))?;

        let renderer = Renderer::new(
            &ctx.settings.tools.ffmpeg_path,
            ctx.settings.render.clone(),
            Duration::from_secs(ctx.settings.timeouts.render_secs),
        );

        // Encode percentages stream to the caller's callback while ffmpeg
        // runs, under this step's name.
        let on_progress: Option<RenderProgress> = ctx.progress_handle().map(|callback| {
            Arc::new(move |percent: u32| {
                callback("Render", percent, "Encoding");
            }) as RenderProgress
        });

        let output = renderer.render(
            plan,
            profile,
            assets,
            &ctx.work_dir,
            &ctx.logger,
            &ctx.cancel,
            on_progress,
        )?;

        state.render = Some(output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let render = state
            .render
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("render result not recorded"))?;
        let nonempty = std::fs::metadata(&render.output_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !nonempty {
            return Err(StepError::invalid_output(format!(
                "rendered output missing or empty at {}",
                render.output_path.display()
            )));
        }
        Ok(())
    }
}
