//! Logging types and configuration.

use serde::{Deserialize, Serialize};

use crate::config::LoggingSettings;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Configuration for the per-job logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to output.
    pub level: LogLevel,
    /// Compact mode: filter progress lines, keep backend output in the
    /// tail buffer only.
    pub compact: bool,
    /// Progress update step percentage.
    pub progress_step: u32,
    /// Number of backend output lines kept for error diagnosis.
    pub error_tail: usize,
    /// Show timestamps in log output.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 40,
            show_timestamps: true,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: LogLevel::Info,
            compact: settings.compact,
            progress_step: settings.progress_step.max(1),
            error_tail: settings.error_tail as usize,
            show_timestamps: settings.show_timestamps,
        }
    }
}

/// Callback receiving each log line, e.g. to stream into a caller's UI.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Shell command: `$ command`
    Command,
    /// Phase marker: `=== Phase ===`
    Phase,
    /// Success: `[SUCCESS]`
    Success,
    /// Warning: `[WARNING]`
    Warning,
    /// Error: `[ERROR]`
    Error,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn prefixes_format() {
        assert_eq!(MessagePrefix::Command.format("ffmpeg -i x"), "$ ffmpeg -i x");
        assert_eq!(MessagePrefix::Phase.format("Render"), "=== Render ===");
    }
}
