//! Render Executor: plan-to-ffmpeg translation plus bounded execution.

mod executor;
mod filtergraph;

pub use executor::{
    build_render_args, RenderError, RenderOutput, RenderProgress, RenderResult, Renderer,
    OUTPUT_FILENAME,
};
pub use filtergraph::{build_filter_complex, build_input_args, AUDIO_OUT, VIDEO_OUT};
