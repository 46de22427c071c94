//! Publish step: deliver the rendered artifact in the requested form.

use std::sync::Arc;

use crate::models::JobStatus;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::publish::{publish_artifact, ObjectStore};

pub struct PublishStep {
    store: Option<Arc<dyn ObjectStore>>,
}

impl PublishStep {
    pub fn new(store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { store }
    }
}

impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "Publish"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.render.is_none() {
            return Err(StepError::invalid_input("nothing rendered to publish"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        state.status = JobStatus::Publishing;

        let render = state
            .render
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("nothing rendered to publish"))?;

        let name = ctx
            .request
            .output_name
            .clone()
            .unwrap_or_else(|| format!("{}.mp4", state.job_id));

        let artifact = publish_artifact(
            &render.output_path,
            ctx.request.delivery,
            &name,
            self.store.as_deref(),
        )?;

        ctx.logger.info(&format!(
            "Published '{}' as {} delivery",
            name, ctx.request.delivery
        ));

        state.artifact = Some(artifact);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let artifact = state
            .artifact
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("artifact not recorded"))?;
        if artifact.value.is_empty() {
            return Err(StepError::invalid_output("artifact value is empty"));
        }
        Ok(())
    }
}
