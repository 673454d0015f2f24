//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// A reload callback tried to reload the store that is notifying it.
    #[error("Config reload requested from inside a reload callback")]
    ReentrantReload,

    /// The file-system watch primitive failed. Logged and retried by the
    /// watcher; only surfaced when the notify backend cannot be created.
    #[error("Failed to watch {path}: {message}")]
    Watch { path: PathBuf, message: String },
}

impl ConfigError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors that mean "nothing to load" rather than "bad input".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound(_))
    }
}
