//! Logging infrastructure for the compositing engine.
//!
//! Two tiers:
//! - `tracing` for library-level diagnostics (enabled by the host process)
//! - a per-job [`JobLogger`] with file + callback dual output and a bounded
//!   tail buffer of backend stderr, which supplies the `backendTrace` field
//!   of failure responses

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize a global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to the provided default directive.
/// Call once at host-process startup.
pub fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
