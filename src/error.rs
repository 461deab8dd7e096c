//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when constructing or restoring a timer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer duration must be positive")]
    ZeroDuration,
}

/// Errors during profile loading and saving
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write profile file {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create profile directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove profile file {path}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read profile directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile JSON in {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode profile {name}")]
    EncodeJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("profile '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("profile '{name}' is active")]
    InUse { name: String },

    #[error("profile '{name}' cannot be deleted")]
    Protected { name: String },
}
