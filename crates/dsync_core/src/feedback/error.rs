//! Feedback system error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from configuring the feedback system or exporting its ledger.
#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Invalid feedback setting '{name}': {value}")]
    InvalidSetting { name: String, value: String },

    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write checkpoint log '{}': {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FeedbackError {
    pub fn invalid_setting(name: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            value: value.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }
}

/// Result type for feedback operations.
pub type FeedbackResult<T> = Result<T, FeedbackError>;
