//! Duration authority error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::BandError;

/// Errors raised while creating or exporting a duration authority.
///
/// Out-of-band durations are not errors; they surface through
/// `register` and `validate_final_result`.
#[derive(Error, Debug)]
pub enum DurationError {
    /// Target or tolerance rejected.
    #[error("Invalid tolerance band: {0}")]
    InvalidBand(#[from] BandError),

    /// A derived-constraint setting is unusable.
    #[error("Invalid duration setting '{name}': {value}")]
    InvalidSetting { name: String, value: f64 },

    /// Failed to serialize the report log.
    #[error("Failed to serialize report log: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the audit log.
    #[error("Failed to write audit log '{}': {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DurationError {
    /// Create an invalid setting error.
    pub fn invalid_setting(name: impl Into<String>, value: f64) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            value,
        }
    }

    /// Create a write error.
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }
}

/// Result type for duration operations.
pub type DurationResult<T> = Result<T, DurationError>;
