//! Caption timing types.
//!
//! All times are seconds on the narration timeline. Conversion to integer
//! milliseconds happens only in the writers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::SplitMethod;

/// A narration segment placed on the timeline from its measured duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegmentInfo {
    pub path: PathBuf,
    /// Probed duration, never an estimate.
    pub duration_secs: f64,
    pub start_secs: f64,
    /// Always `start_secs + duration_secs`.
    pub end_secs: f64,
    /// Text spoken in this segment.
    pub text: String,
    /// Always 1.0 (measured).
    pub confidence: f64,
}

/// One caption cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    /// Display text, lines separated by `\n`.
    pub text: String,
    /// Narration artifact this cue was derived from.
    pub source_audio: PathBuf,
    pub split_method: SplitMethod,
}

impl SubtitleSegment {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Result of wrapping caption text into lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Words that did not fit in the allowed lines.
    pub dropped_words: usize,
}

impl WrappedText {
    /// Lines joined for display.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Output formats for caption files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip (.srt)
    #[default]
    Srt,
    /// WebVTT (.vtt)
    WebVtt,
}

impl SubtitleFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::WebVtt),
            _ => None,
        }
    }

    /// Get the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::WebVtt => "vtt",
        }
    }
}

/// Rounding mode for time values when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    Floor,
    /// Round to nearest.
    #[default]
    Round,
    Ceil,
}

impl RoundingMode {
    /// Round float milliseconds to whole milliseconds.
    pub fn apply(&self, ms: f64) -> f64 {
        match self {
            Self::Floor => ms.floor(),
            Self::Round => ms.round(),
            Self::Ceil => ms.ceil(),
        }
    }
}

/// Options for writing caption files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    pub rounding: RoundingMode,
}
