//! Subtitle writers for SRT and WebVTT.
//!
//! Each writer is a pure function that takes segments and returns a formatted string.

mod srt;
mod vtt;

pub use srt::{format_srt_time, write_srt};
pub use vtt::{format_vtt_time, write_vtt};

use std::fs;
use std::path::Path;

use crate::subtitles::error::{SubtitleError, SubtitleResult};
use crate::subtitles::types::{SubtitleFormat, SubtitleSegment, WriteOptions};

/// Render segments in the specified format.
pub fn write_content(
    segments: &[SubtitleSegment],
    format: SubtitleFormat,
    options: &WriteOptions,
) -> String {
    match format {
        SubtitleFormat::Srt => write_srt(segments, options),
        SubtitleFormat::WebVtt => write_vtt(segments, options),
    }
}

/// Write segments to `path`, picking the format from its extension.
pub fn write_subtitle_file(
    segments: &[SubtitleSegment],
    path: &Path,
    options: &WriteOptions,
) -> SubtitleResult<SubtitleFormat> {
    let format = SubtitleFormat::from_extension(path)
        .ok_or_else(|| SubtitleError::UnknownFormat(path.to_path_buf()))?;

    let write_err = |source| SubtitleError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    fs::write(path, write_content(segments, format, options)).map_err(write_err)?;

    tracing::info!("Wrote {} {} cues to {}", segments.len(), format.extension(), path.display());
    Ok(format)
}
