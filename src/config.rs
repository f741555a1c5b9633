use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the API base URL, mirroring how the site
/// deployment configures it.
pub const API_URL_ENV: &str = "JAMDEVIENTOS_API_URL";

const APP_DIR: &str = "jamdevientos";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the SheetMusic service, without trailing slash
    pub api_base_url: String,

    /// Collective slug used in the events endpoints
    pub collective: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Playback volume for previews (0.0 to 1.0)
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            collective: "jamdevientos".to_string(),
            request_timeout_secs: 10,
            volume: 0.7,
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory.
    /// Creates default config if the file doesn't exist. The API base URL
    /// can always be overridden through `JAMDEVIENTOS_API_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).map_err(|e| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(e),
                })?;
            serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: config_path.display().to_string(),
                source: Box::new(e),
            })?
        } else {
            let config = Config::default();
            config.save()?;
            tracing::info!("Created default config at: {}", config_path.display());
            config
        };

        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.api_base_url = url;
            }
        }
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(&config_path, json).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    /// Application directory under the platform config dir
    pub fn app_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR))
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir().join("config.json"))
    }

    /// Config directory path for display purposes
    pub fn config_dir_display() -> String {
        Self::app_dir().display().to_string()
    }
}
