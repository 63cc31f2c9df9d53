//! Types produced by the audio processor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::config::AudioSettings;

/// Probed properties of a media artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioProbe {
    pub path: PathBuf,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Codec of the first audio stream.
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
    /// Bits per second.
    pub bit_rate: Option<u64>,
    /// Whether a video stream is present.
    pub has_video: bool,
}

impl AudioProbe {
    /// Probe result carrying only a duration.
    pub fn with_duration(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
            codec: None,
            sample_rate: None,
            channels: None,
            bit_rate: None,
            has_video: false,
        }
    }
}

/// Result of probing one artifact.
///
/// Unusable artifacts are reported here rather than raised, so callers can
/// drop them and continue.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Measured(AudioProbe),
    Unusable { path: PathBuf, reason: String },
}

impl ProbeOutcome {
    /// Measured duration, if the artifact is usable.
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Measured(probe) => Some(probe.duration_secs),
            ProbeOutcome::Unusable { .. } => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, ProbeOutcome::Measured(_))
    }
}

/// The single format every segment is transcoded to before joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFormat {
    pub sample_rate: u32,
    pub channels: u8,
    pub codec: String,
    pub bitrate: String,
    pub extension: String,
}

impl CanonicalFormat {
    pub fn from_settings(settings: &AudioSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            channels: settings.channels,
            codec: settings.codec.clone(),
            bitrate: settings.bitrate.clone(),
            extension: settings.extension.clone(),
        }
    }
}

/// One segment after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSegment {
    /// Original artifact.
    pub source: PathBuf,
    /// Transcoded artifact inside the set's temp directory.
    pub path: PathBuf,
    /// Duration re-measured from the transcoded artifact.
    pub duration_secs: f64,
}

/// Normalized segments plus the temp directory that owns them.
///
/// Dropping the set deletes every transcoded file.
#[derive(Debug)]
pub struct NormalizedSet {
    dir: TempDir,
    segments: Vec<NormalizedSegment>,
    skipped: Vec<ProbeOutcome>,
}

impl NormalizedSet {
    pub(crate) fn new(
        dir: TempDir,
        segments: Vec<NormalizedSegment>,
        skipped: Vec<ProbeOutcome>,
    ) -> Self {
        Self {
            dir,
            segments,
            skipped,
        }
    }

    /// Temp directory holding the transcoded files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn segments(&self) -> &[NormalizedSegment] {
        &self.segments
    }

    /// Inputs rejected during normalization, with reasons.
    pub fn skipped(&self) -> &[ProbeOutcome] {
        &self.skipped
    }

    /// Transcoded paths in input order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.segments.iter().map(|s| s.path.clone()).collect()
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Result of a concatenation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatReport {
    pub output: PathBuf,
    pub input_count: usize,
    /// Sum of the input durations.
    pub expected_duration_secs: f64,
    /// Probed duration of the output, if it could be measured.
    pub measured_duration_secs: Option<f64>,
    /// Whether the output is within epsilon of the expected duration.
    pub within_epsilon: bool,
}

/// Which stream was cut when muxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxTruncation {
    /// Streams already matched.
    None,
    /// Video was longer than audio.
    Video,
    /// Audio was longer than video.
    Audio,
}

/// Result of muxing video with narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxReport {
    pub output: PathBuf,
    pub video_duration_secs: f64,
    pub audio_duration_secs: f64,
    /// Always the shorter of the two inputs.
    pub output_duration_secs: f64,
    pub truncated: MuxTruncation,
}
