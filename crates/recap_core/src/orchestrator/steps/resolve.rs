//! Resolve step: fetch/decode all request assets into the work directory.

use std::time::Duration;

use crate::models::{AssetKind, ResolvedAssets};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::resolve::Resolver;

pub struct ResolveStep;

impl PipelineStep for ResolveStep {
    fn name(&self) -> &str {
        "Resolve"
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StepResult<()> {
        if ctx.request.video.value.trim().is_empty() {
            return Err(StepError::invalid_input("video asset value is empty"));
        }
        if ctx.request.chart.value.trim().is_empty() {
            return Err(StepError::invalid_input("chart asset value is empty"));
        }
        if let Some(ref audio) = ctx.request.audio {
            if audio.value.trim().is_empty() {
                return Err(StepError::invalid_input("audio asset value is empty"));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let timeout = Duration::from_secs(ctx.settings.timeouts.fetch_secs);
        let resolver = Resolver::new(timeout)?;

        let video = resolver.resolve(&ctx.request.video, AssetKind::Video, &ctx.work_dir)?;
        let chart = resolver.resolve(&ctx.request.chart, AssetKind::Image, &ctx.work_dir)?;
        let audio = match ctx.request.audio {
            Some(ref input) => Some(resolver.resolve(input, AssetKind::Audio, &ctx.work_dir)?),
            None => None,
        };

        ctx.logger.info(&format!(
            "Resolved {} assets ({} bytes total)",
            2 + audio.is_some() as usize,
            video.size_bytes + chart.size_bytes + audio.as_ref().map_or(0, |a| a.size_bytes)
        ));

        state.assets = Some(ResolvedAssets {
            video,
            chart,
            audio,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let assets = state
            .assets
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("assets not recorded"))?;

        for asset in [&assets.video, &assets.chart]
            .into_iter()
            .chain(assets.audio.as_ref())
        {
            if !asset.resolved_path.exists() {
                return Err(StepError::invalid_output(format!(
                    "resolved {} missing at {}",
                    asset.kind,
                    asset.resolved_path.display()
                )));
            }
        }
        Ok(())
    }
}
