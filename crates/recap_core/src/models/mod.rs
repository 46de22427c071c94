//! Data models for the compositing engine.
//!
//! - Enums for asset kinds, source forms, delivery modes, job status
//! - Asset descriptors (caller inputs and resolved local files)
//! - Probed media profile
//! - Composition policy and plan
//! - Boundary request/response types

mod assets;
mod enums;
mod media;
mod plan;
mod policy;
mod request;

pub use assets::{AssetInput, MediaAsset, ResolvedAssets};
pub use enums::{AssetKind, DeliveryMode, JobStatus, SourceForm};
pub use media::MediaProfile;
pub use plan::{AudioSegment, CompositionPlan, VideoSegment};
pub use policy::{AudioMixWeights, BreakWindow, CompositionPolicy, OverlayWindow};
pub use request::{ArtifactForm, ComposeRequest, ComposeResponse, OutputArtifact};
