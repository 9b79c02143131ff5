use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::PlaybackGeometry;

/// Environment variable that overrides the hosted backend API key
pub const API_KEY_ENV: &str = "DUALPLAY_API_KEY";

/// Settings shared by every player built from a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Geometry applied to players before their first `play`
    pub geometry: PlaybackGeometry,
    /// Hosted video backend settings
    pub hosted: HostedConfig,
}

/// Configuration for the hosted video backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedConfig {
    /// Developer credential handed unchanged to the hosting SDK
    pub api_key: String,
}

impl PlayerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;

        info!("Config loaded from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                debug!("Using API key from {}", API_KEY_ENV);
                self.hosted.api_key = key;
            }
        }
    }
}
