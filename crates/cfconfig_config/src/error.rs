//! Error types for the config module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while reading or generating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cloud-config.json not found at {0}")]
    NotFound(PathBuf),

    #[error("Missing required key '{key}' in {path}")]
    MissingKey { path: PathBuf, key: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Environment '{0}' not found in config table")]
    UnknownEnvironment(String),

    #[error("Unknown config: {0}")]
    UnknownKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
