// src/error.rs

//! Error types for onionsite

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, deriving, rendering or provisioning sites
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unsafe site name or path
    #[error("Invalid site specification: {0}")]
    InvalidSpec(String),

    /// Two distinct sites resolve to the same path
    #[error("Sites '{first}' and '{second}' both use {kind} {path}")]
    ConflictingPaths {
        kind: &'static str,
        path: PathBuf,
        first: String,
        second: String,
    },

    /// A filesystem operation failed while executing a provisioning step
    #[error("Provisioning step '{step}' failed on {}: {source}", path.display())]
    Provisioning {
        step: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A service user or group could not be resolved
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Rendered configuration rejected by Tor or nginx
    #[error("Downstream configuration error: {0}")]
    DownstreamConfig(String),

    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error with the provisioning step and path it occurred on
    pub fn provisioning(step: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Provisioning {
            step: step.into(),
            path: path.into(),
            source,
        }
    }
}
