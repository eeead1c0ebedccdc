//! Error types for ndk-matrix core
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving build settings
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("settings file not found: {0}")]
    SettingsNotFound(PathBuf),

    #[error("invalid build type '{0}' (expected Release, Debug or RelWithDebInfo)")]
    InvalidBuildType(String),

    #[error("invalid API level '{0}' (expected a positive integer such as 24 or android-24)")]
    InvalidApiLevel(String),

    #[error("invalid value for {key}: {message}")]
    InvalidSetting { key: String, message: String },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Wrap a value error with the name of the setting it came from
    pub fn for_key(self, key: &str) -> Self {
        match self {
            CoreError::InvalidSetting { .. } => self,
            other => CoreError::InvalidSetting {
                key: key.to_string(),
                message: other.to_string(),
            },
        }
    }
}
