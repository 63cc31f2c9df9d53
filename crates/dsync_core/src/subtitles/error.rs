//! Subtitle error types.

use std::path::PathBuf;

use crate::audio::AudioError;

/// Errors that can occur while timing or writing captions.
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    /// Every narration artifact was missing or unmeasurable.
    #[error("No valid audio segments to derive subtitles from")]
    NoValidSegments,

    /// Probing failed in a way that is not a per-artifact problem.
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Failed to write subtitle file.
    #[error("Failed to write file '{}': {source}", .path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Option value that cannot produce captions.
    #[error("Invalid subtitle option {name}: {value}")]
    InvalidOption { name: &'static str, value: String },

    /// Unknown or unsupported subtitle format.
    #[error("Unknown subtitle format for file '{}'", .0.display())]
    UnknownFormat(PathBuf),
}

/// Result type for subtitle operations.
pub type SubtitleResult<T> = Result<T, SubtitleError>;
