//! Settings file handling
//!
//! The API credential and request deadline live in a TOML file in the
//! platform config directory. The `SKYCAST_API_KEY` environment variable
//! overrides the stored key, which keeps credentials out of the file on
//! shared machines.

use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::openweather::DEFAULT_TIMEOUT_SECS;

/// Environment variable overriding the stored API key
pub const API_KEY_ENV: &str = "SKYCAST_API_KEY";

/// Errors that can occur when loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined
    #[error("could not determine a configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No API key is available from the file or the environment
    #[error("no API key configured; run `skycast configure --api-key <KEY>` or set SKYCAST_API_KEY")]
    MissingApiKey,
}

/// Settings stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// OpenWeather API credential
    pub api_key: Option<String>,
    /// Request deadline in seconds (defaults when absent)
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from disk, or return defaults when no file exists yet
    ///
    /// The environment override is applied after the file is read.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;

        let mut settings = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.is_empty() {
                settings.api_key = Some(key);
            }
        }

        Ok(settings)
    }

    /// Save settings to disk, creating parent directories as needed
    ///
    /// Returns the path written so callers can report it.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        fs::write(&path, toml)?;

        Ok(path)
    }

    /// Path to the settings file
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "skycast").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the API key, or an error telling the user how to set one
    pub fn resolved_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// The request deadline to hand the API client
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
