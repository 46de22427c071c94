//! Concrete pipeline steps for the compose pipeline.

mod plan;
mod probe;
mod publish;
mod render;
mod resolve;

pub use plan::PlanStep;
pub use probe::ProbeStep;
pub use publish::PublishStep;
pub use render::RenderStep;
pub use resolve::ResolveStep;
