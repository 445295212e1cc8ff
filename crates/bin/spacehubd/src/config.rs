//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `spacehub.toml` in the working directory, or at the path named
//! by `SPACEHUB_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "spacehub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Sensor registry location.
    pub registry: RegistryConfig,
    /// Announcement settings.
    pub announcer: AnnouncerConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Where the registry description file lives.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    /// Announce every arrival and departure.
    pub enabled: bool,
}

impl Config {
    /// Load configuration from `spacehub.toml` (or `SPACEHUB_CONFIG`, if
    /// set) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SPACEHUB_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SPACEHUB_REGISTRY") {
            self.registry.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("SPACEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "registry path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the registry description file.
    #[must_use]
    pub fn registry_path(&self) -> &Path {
        &self.registry.path
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "spacehubd=info,spacehub=info".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("registry.toml"),
        }
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
