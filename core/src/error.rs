use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a local media engine while acquiring a surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("media source rejected '{uri}': {reason}")]
    SourceRejected { uri: String, reason: String },
}

/// Reasons the hosting SDK can give for a failed initialization handshake
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("developer key was rejected by the hosting service")]
    InvalidApiKey,

    #[error("hosting service is not installed or disabled on this device")]
    ServiceMissing,

    #[error("network error: {0}")]
    Network(String),

    #[error("initialization failed: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
