//! Configuration management for the compositing engine.
//!
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Serde defaults per field so partial files load cleanly

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    LoggingSettings, PathSettings, RenderSettings, Settings, TimeoutSettings, ToolSettings,
};
