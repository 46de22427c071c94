//! Config manager for loading and saving settings.
//!
//! Writes are atomic: serialize to a temp file in the same directory, then
//! rename over the target.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::Settings;

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages engine configuration on disk.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Changes are only in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file. Errors if the file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load config from file, creating it with defaults if it doesn't exist.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            self.load()
        } else {
            if let Some(parent) = self.config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            self.settings = Settings::default();
            self.save()
        }
    }

    /// Save current settings atomically (temp file + rename).
    pub fn save(&self) -> ConfigResult<()> {
        let content = toml::to_string_pretty(&self.settings)?;

        let tmp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.config_path)?;
        Ok(())
    }

    /// Ensure the configured temp and log directories exist.
    pub fn ensure_directories(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.settings.paths.temp_root)?;
        fs::create_dir_all(&self.settings.paths.logs_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        assert!(path.exists());
        assert_eq!(manager.settings().tools.ffprobe_path, "ffprobe");
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();
        manager.settings_mut().timeouts.render_secs = 42;
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().timeouts.render_secs, 42);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("missing.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }
}
