//! Audio processing error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from probing, transcoding, concatenating or muxing.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Artifact does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The external tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The external tool exited with an error.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The external tool exceeded its wall-clock limit and was killed.
    #[error("{tool} timed out after {seconds}s and was killed")]
    Timeout { tool: String, seconds: u64 },

    /// Tool output could not be interpreted.
    #[error("Failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// Artifact reports no playable duration.
    #[error("Artifact has zero duration: {}", .0.display())]
    ZeroDuration(PathBuf),

    /// Every input artifact was rejected.
    #[error("No valid audio segments")]
    NoValidSegments,

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl AudioError {
    /// Create a spawn failure.
    pub fn spawn_failed(tool: impl Into<String>, source: io::Error) -> Self {
        Self::SpawnFailed {
            tool: tool.into(),
            source,
        }
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Whether this error only disqualifies one artifact.
    ///
    /// Spawn failures, timeouts and I/O errors are tool failures and must
    /// propagate.
    pub fn is_measurement_failure(&self) -> bool {
        matches!(
            self,
            AudioError::FileNotFound(_)
                | AudioError::CommandFailed { .. }
                | AudioError::ParseError { .. }
                | AudioError::ZeroDuration(_)
        )
    }
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;
