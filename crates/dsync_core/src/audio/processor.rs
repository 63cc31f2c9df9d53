//! Artifact-safe audio processing.
//!
//! Segments are transcoded one by one to a single canonical format and only
//! then joined by stream copy. No blending filter ever runs at join time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use super::error::{AudioError, AudioResult};
use super::runner::ToolRunner;
use super::tool::{FfmpegTool, MediaTool};
use super::types::{
    CanonicalFormat, ConcatReport, MuxReport, MuxTruncation, NormalizedSegment, NormalizedSet,
    ProbeOutcome,
};
use crate::config::{AudioSettings, Settings};

/// Durations closer than this are treated as equal when muxing.
const MUX_MATCH_EPSILON: f64 = 1e-3;

/// Probes, normalizes, concatenates and muxes audio artifacts.
#[derive(Clone)]
pub struct AudioProcessor {
    tool: Arc<dyn MediaTool>,
    format: CanonicalFormat,
    padding_secs: f64,
    concat_epsilon_secs: f64,
    temp_root: PathBuf,
}

impl std::fmt::Debug for AudioProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioProcessor")
            .field("format", &self.format)
            .field("padding_secs", &self.padding_secs)
            .field("concat_epsilon_secs", &self.concat_epsilon_secs)
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}

impl AudioProcessor {
    /// Create a processor over an arbitrary media tool.
    ///
    /// Temp directories for normalized segments are created under `temp_root`.
    pub fn new(
        tool: Arc<dyn MediaTool>,
        settings: &AudioSettings,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tool,
            format: CanonicalFormat::from_settings(settings),
            padding_secs: settings.segment_padding_secs,
            concat_epsilon_secs: settings.concat_epsilon_secs,
            temp_root: temp_root.into(),
        }
    }

    /// Create a processor backed by ffmpeg/ffprobe.
    pub fn with_ffmpeg(settings: &Settings) -> Self {
        let runner = ToolRunner::new(Duration::from_secs(settings.audio.tool_timeout_secs))
            .with_command_logging(settings.logging.log_commands);
        let tool = FfmpegTool::new(&settings.audio).with_runner(runner);
        Self::new(Arc::new(tool), &settings.audio, &settings.paths.temp_root)
    }

    /// Move temp directories under another root.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn canonical_format(&self) -> &CanonicalFormat {
        &self.format
    }

    /// Gap inserted between consecutive narration segments.
    pub fn segment_padding_secs(&self) -> f64 {
        self.padding_secs
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Measure one artifact.
    ///
    /// Missing, corrupt and zero-length artifacts come back as
    /// `ProbeOutcome::Unusable`. Spawn failures and timeouts are errors.
    pub fn probe(&self, path: &Path) -> AudioResult<ProbeOutcome> {
        match self.tool.probe(path) {
            Ok(probe) if probe.duration_secs.is_finite() && probe.duration_secs > 0.0 => {
                tracing::debug!("Probed {}: {:.3}s", path.display(), probe.duration_secs);
                Ok(ProbeOutcome::Measured(probe))
            }
            Ok(_) => Ok(ProbeOutcome::Unusable {
                path: path.to_path_buf(),
                reason: AudioError::ZeroDuration(path.to_path_buf()).to_string(),
            }),
            Err(e) if e.is_measurement_failure() => Ok(ProbeOutcome::Unusable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Transcode every usable artifact to the canonical format.
    ///
    /// Each transcoded file is probed again and only accepted with a nonzero
    /// duration. Rejected inputs are logged and listed in the set's
    /// `skipped()`; an empty result is `AudioError::NoValidSegments`.
    pub fn normalize(&self, artifacts: &[PathBuf]) -> AudioResult<NormalizedSet> {
        let dir = self.create_temp_dir()?;
        let mut segments = Vec::with_capacity(artifacts.len());
        let mut skipped = Vec::new();

        for (i, source) in artifacts.iter().enumerate() {
            if let outcome @ ProbeOutcome::Unusable { .. } = self.probe(source)? {
                log_skip(&outcome);
                skipped.push(outcome);
                continue;
            }

            let output = dir
                .path()
                .join(format!("segment_{:03}.{}", i, self.format.extension));
            self.tool.transcode(source, &output, &self.format)?;

            match self.probe(&output)? {
                ProbeOutcome::Measured(probe) => segments.push(NormalizedSegment {
                    source: source.clone(),
                    path: output,
                    duration_secs: probe.duration_secs,
                }),
                ProbeOutcome::Unusable { reason, .. } => {
                    let outcome = ProbeOutcome::Unusable {
                        path: source.clone(),
                        reason: format!("transcoded output unusable: {}", reason),
                    };
                    log_skip(&outcome);
                    skipped.push(outcome);
                }
            }
        }

        if segments.is_empty() {
            tracing::error!("None of {} audio artifacts survived normalization", artifacts.len());
            return Err(AudioError::NoValidSegments);
        }

        tracing::info!(
            "Normalized {}/{} segments to {} Hz, {} ch, {}",
            segments.len(),
            artifacts.len(),
            self.format.sample_rate,
            self.format.channels,
            self.format.codec
        );

        Ok(NormalizedSet::new(dir, segments, skipped))
    }

    /// Join artifacts in order into `output`.
    ///
    /// Unusable inputs are skipped. A single input is copied; several are
    /// joined by stream copy. An output that differs from the summed input
    /// durations by more than the epsilon is logged, not rejected.
    pub fn concatenate(&self, artifacts: &[PathBuf], output: &Path) -> AudioResult<ConcatReport> {
        let mut inputs = Vec::with_capacity(artifacts.len());
        let mut expected = 0.0;

        for artifact in artifacts {
            match self.probe(artifact)? {
                ProbeOutcome::Measured(probe) => {
                    expected += probe.duration_secs;
                    inputs.push(artifact.clone());
                }
                outcome => log_skip(&outcome),
            }
        }

        if inputs.is_empty() {
            return Err(AudioError::NoValidSegments);
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AudioError::io_error("creating output directory", e))?;
            }
        }

        if let [single] = inputs.as_slice() {
            fs::copy(single, output)
                .map_err(|e| AudioError::io_error("copying single segment", e))?;
        } else {
            self.tool.concat(&inputs, output)?;
        }

        let measured = self.probe(output)?.duration_secs();
        let within_epsilon = match measured {
            Some(m) => (m - expected).abs() <= self.concat_epsilon_secs,
            None => false,
        };

        match measured {
            Some(m) if !within_epsilon => tracing::warn!(
                "Concatenated duration {:.3}s differs from expected {:.3}s by more than {:.3}s",
                m,
                expected,
                self.concat_epsilon_secs
            ),
            None => tracing::warn!("Could not measure concatenated output {}", output.display()),
            _ => tracing::info!(
                "Concatenated {} segments into {} ({:.3}s)",
                inputs.len(),
                output.display(),
                expected
            ),
        }

        Ok(ConcatReport {
            output: output.to_path_buf(),
            input_count: inputs.len(),
            expected_duration_secs: expected,
            measured_duration_secs: measured,
            within_epsilon,
        })
    }

    /// Normalize, then concatenate the normalized segments.
    ///
    /// The intermediate files are removed when this returns, whether it
    /// succeeds or not.
    pub fn normalize_and_concatenate(
        &self,
        artifacts: &[PathBuf],
        output: &Path,
    ) -> AudioResult<ConcatReport> {
        let set = self.normalize(artifacts)?;
        self.concatenate(&set.paths(), output)
    }

    /// Combine video with narration, cut to the shorter of the two.
    ///
    /// The video stream is copied untouched; only audio is re-encoded.
    pub fn mux(&self, video: &Path, audio: &Path, output: &Path) -> AudioResult<MuxReport> {
        let video_duration = self.require_duration(video)?;
        let audio_duration = self.require_duration(audio)?;
        let output_duration = video_duration.min(audio_duration);

        let truncated = if (video_duration - audio_duration).abs() <= MUX_MATCH_EPSILON {
            MuxTruncation::None
        } else if video_duration > audio_duration {
            MuxTruncation::Video
        } else {
            MuxTruncation::Audio
        };

        if truncated != MuxTruncation::None {
            tracing::info!(
                "Muxing video {:.3}s with audio {:.3}s, truncating to {:.3}s",
                video_duration,
                audio_duration,
                output_duration
            );
        }

        self.tool
            .mux(video, audio, output, output_duration, &self.format)?;

        Ok(MuxReport {
            output: output.to_path_buf(),
            video_duration_secs: video_duration,
            audio_duration_secs: audio_duration,
            output_duration_secs: output_duration,
            truncated,
        })
    }

    /// Duration of an input that must be usable.
    fn require_duration(&self, path: &Path) -> AudioResult<f64> {
        let probe = self.tool.probe(path)?;
        if probe.duration_secs.is_finite() && probe.duration_secs > 0.0 {
            Ok(probe.duration_secs)
        } else {
            Err(AudioError::ZeroDuration(path.to_path_buf()))
        }
    }

    fn create_temp_dir(&self) -> AudioResult<TempDir> {
        fs::create_dir_all(&self.temp_root)
            .map_err(|e| AudioError::io_error("creating temp root", e))?;
        tempfile::Builder::new()
            .prefix("dsync-")
            .tempdir_in(&self.temp_root)
            .map_err(|e| AudioError::io_error("creating temp directory", e))
    }
}

fn log_skip(outcome: &ProbeOutcome) {
    if let ProbeOutcome::Unusable { path, reason } = outcome {
        tracing::warn!("Skipping audio artifact {}: {}", path.display(), reason);
    }
}
