use std::path::PathBuf;
use thiserror::Error;

/// Failures of the on-disk key-value file.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by a notification backend.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification backend error: {0}")]
    Backend(String),

    #[error("notification service unavailable")]
    Unavailable,
}

impl From<notify_rust::error::Error> for NotifyError {
    fn from(err: notify_rust::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("reset hour must be in 0..=23, got {0}")]
    ResetHour(u32),

    #[error("adjust step must be positive, got {0}")]
    AdjustStep(i64),
}
