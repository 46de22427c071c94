//! Recap Core - compositing engine for Recap Studio
//!
//! This crate contains all business logic with zero UI dependencies: it
//! turns a video, a chart image, an optional background track, and a
//! composition policy into one rendered MP4, delivered inline or via an
//! object store. An HTTP front end or a CLI can sit on top of
//! [`orchestrator::Composer`] without further glue.

pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod plan;
pub mod probe;
pub mod publish;
pub mod render;
pub mod resolve;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
