//! Boundary request/response types for the compose entry point.
//!
//! These serialize to the shapes an HTTP front end forwards verbatim.

use serde::{Deserialize, Serialize};

use super::assets::AssetInput;
use super::enums::DeliveryMode;
use super::policy::CompositionPolicy;

/// One compose request: the three logical inputs, the policy, and how the
/// result should be delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeRequest {
    /// The base talking-head video.
    pub video: AssetInput,
    /// The chart still image.
    pub chart: AssetInput,
    /// Optional background audio track.
    #[serde(default)]
    pub audio: Option<AssetInput>,
    /// Composition policy (overlay/break windows, mix weights).
    #[serde(default)]
    pub policy: CompositionPolicy,
    /// Delivery mode for the output artifact.
    #[serde(default)]
    pub delivery: DeliveryMode,
    /// Object name used for `uploaded` delivery; defaults to the job id.
    #[serde(default)]
    pub output_name: Option<String>,
}

/// Delivery form of a produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactForm {
    Inline,
    Uploaded,
}

/// The rendered output in its delivered form: a `data:video/mp4;base64,`
/// URI for inline delivery, or the object store's public URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputArtifact {
    pub form: ArtifactForm,
    pub value: String,
}

/// Response envelope for one compose request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComposeResponse {
    Done {
        artifact: OutputArtifact,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        /// Pipeline stage that failed.
        stage: String,
        /// Typed error kind, e.g. `PlanningError` or `RenderTimeout`.
        error_kind: String,
        /// Human-readable cause.
        message: String,
        /// Backend command line and stderr tail, when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        backend_trace: Option<String>,
    },
}

impl ComposeResponse {
    pub fn is_done(&self) -> bool {
        matches!(self, ComposeResponse::Done { .. })
    }
}
