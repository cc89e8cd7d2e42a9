//! Application configuration management.
//!
//! Handles loading, saving, and managing application-wide settings: the
//! music library directory used for save suggestions, export behaviour and
//! the publish target.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::publish::DEFAULT_PUBLISH_TIMEOUT_SECS;

/// Label pushed with every publish unless overridden.
pub const DEFAULT_PUBLISH_LABEL: &str = "Ruff Cut";

const fn default_true() -> bool {
    true
}

fn default_label() -> String {
    DEFAULT_PUBLISH_LABEL.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_PUBLISH_TIMEOUT_SECS
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Write unknown extensions as CSV instead of failing.
    #[serde(default = "default_true")]
    pub fallback_to_csv: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fallback_to_csv: true,
        }
    }
}

/// Publish settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// Upload endpoint URL; publishing fails as unreachable without one.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Label sent with each push.
    #[serde(default = "default_label")]
    pub label: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send track rows along with label and date.
    #[serde(default)]
    pub include_tracks: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            label: default_label(),
            timeout_secs: DEFAULT_PUBLISH_TIMEOUT_SECS,
            include_tracks: false,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Root directory suggested by open and save prompts.
    #[serde(default = "default_library_directory")]
    pub library_directory: PathBuf,
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
    /// Publish settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_directory: default_library_directory(),
            export: ExportConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or create defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        debug!("Library directory: {}", config.library_directory.display());
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Configuration(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            Error::Configuration(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.publish.timeout_secs == 0 {
            return Err(Error::Configuration(
                "publish.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if let Some(endpoint) = &self.publish.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(Error::Configuration(format!(
                "publish.endpoint must be an http(s) URL: {endpoint}"
            )));
        }

        Ok(())
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default library directory.
#[must_use]
pub fn default_library_directory() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("setlist")
        .join("config.json")
}

/// Configuration manager that handles loading and caching config.
#[derive(Debug)]
pub struct ConfigManager {
    config: AppConfig,
    path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager, loading config from the default location.
    pub fn new() -> Result<Self> {
        Self::with_path(config_file_path())
    }

    /// Create a config manager backed by a specific file.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let config = AppConfig::load_from(&path)?;
        Ok(Self { config, path })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Path of the backing config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace and persist the configuration.
    pub fn update(&mut self, config: AppConfig) -> Result<()> {
        config.validate()?;
        config.save_to(&self.path)?;
        self.config = config;
        Ok(())
    }

    /// Reset to default configuration.
    pub fn reset(&mut self) -> Result<()> {
        self.config = AppConfig::default();
        self.config.save_to(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.library_directory.as_os_str().is_empty());
        assert!(config.export.fallback_to_csv);
        assert_eq!(config.publish.label, "Ruff Cut");
        assert_eq!(config.publish.endpoint, None);
        assert!(!config.publish.include_tracks);
    }

    #[test]
    fn test_load_missing_writes_defaults() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let path = temp_dir.path().join("nested").join("config.json");

        let config = AppConfig::load_from(&path).expect("Should load defaults");
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let path = temp_dir.path().join("config.json");

        let config = AppConfig {
            library_directory: PathBuf::from("/music"),
            export: ExportConfig {
                fallback_to_csv: false,
            },
            publish: PublishConfig {
                endpoint: Some("https://example.org/upload".to_string()),
                ..Default::default()
            },
        };
        config.save_to(&path).expect("Should save");

        let loaded = AppConfig::load_from(&path).expect("Should load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"publish":{"endpoint":"http://localhost:8080/push"}}"#;
        let config: AppConfig = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(
            config.publish.endpoint.as_deref(),
            Some("http://localhost:8080/push")
        );
        assert_eq!(config.publish.label, DEFAULT_PUBLISH_LABEL);
        assert_eq!(config.publish.timeout_secs, DEFAULT_PUBLISH_TIMEOUT_SECS);
        assert!(config.export.fallback_to_csv);
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("Should write file");

        let result = AppConfig::load_from(&path);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = AppConfig::default();
        config.publish.endpoint = Some("ftp://example.org".to_string());
        let err = config.validate().expect_err("Should reject endpoint");
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.publish.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_manager_update_and_reset() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let path = temp_dir.path().join("config.json");
        let mut manager = ConfigManager::with_path(path.clone()).expect("Should create manager");

        let mut config = manager.config().clone();
        config.publish.label = "Late Show".to_string();
        manager.update(config).expect("Should update");

        let reloaded = AppConfig::load_from(&path).expect("Should reload");
        assert_eq!(reloaded.publish.label, "Late Show");

        manager.reset().expect("Should reset");
        assert_eq!(manager.config(), &AppConfig::default());
    }

    #[test]
    fn test_config_manager_rejects_invalid_update() {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let mut manager = ConfigManager::with_path(temp_dir.path().join("config.json"))
            .expect("Should create manager");

        let mut config = manager.config().clone();
        config.publish.timeout_secs = 0;
        assert!(manager.update(config).is_err());
        assert_eq!(manager.config().publish.timeout_secs, DEFAULT_PUBLISH_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_file_path_uses_correct_name() {
        let path = AppConfig::config_file_path();
        assert!(path.to_string_lossy().ends_with("config.json"));
        assert!(path.to_string_lossy().contains("setlist"));
    }
}
