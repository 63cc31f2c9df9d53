//! Audio-first caption timing.
//!
//! Caption times come from probing the narration that was actually
//! produced. Script-time estimates are never used here.

use std::path::{Path, PathBuf};

use super::error::{SubtitleError, SubtitleResult};
use super::types::{AudioSegmentInfo, SubtitleFormat, SubtitleSegment, WriteOptions};
use super::wrap::format_subtitle_text;
use super::writers::write_subtitle_file;
use crate::audio::{AudioProcessor, ProbeOutcome};
use crate::config::SubtitleSettings;
use crate::models::SplitMethod;

/// Derives caption segments from measured narration audio.
#[derive(Debug, Clone)]
pub struct SubtitleGenerator {
    audio: AudioProcessor,
    settings: SubtitleSettings,
}

impl SubtitleGenerator {
    pub fn new(audio: AudioProcessor, settings: &SubtitleSettings) -> Self {
        Self {
            audio,
            settings: settings.clone(),
        }
    }

    pub fn settings(&self) -> &SubtitleSettings {
        &self.settings
    }

    /// Place narration artifacts on one timeline.
    ///
    /// `texts[i]` is the text spoken in `artifacts[i]`. Artifacts that cannot
    /// be measured are dropped with a warning; the kept segment `i` starts at
    /// the sum of the previous kept durations plus `i` paddings.
    pub fn analyze_audio_segments(
        &self,
        artifacts: &[PathBuf],
        texts: &[String],
    ) -> SubtitleResult<Vec<AudioSegmentInfo>> {
        let padding = self.audio.segment_padding_secs();
        let mut segments: Vec<AudioSegmentInfo> = Vec::with_capacity(artifacts.len());
        let mut elapsed = 0.0;

        for (i, artifact) in artifacts.iter().enumerate() {
            let duration = match self.audio.probe(artifact)? {
                ProbeOutcome::Measured(probe) => probe.duration_secs,
                ProbeOutcome::Unusable { path, reason } => {
                    tracing::warn!("Dropping narration segment {}: {}", path.display(), reason);
                    continue;
                }
            };

            let start = elapsed + segments.len() as f64 * padding;
            segments.push(AudioSegmentInfo {
                path: artifact.clone(),
                duration_secs: duration,
                start_secs: start,
                end_secs: start + duration,
                text: texts.get(i).cloned().unwrap_or_default(),
                confidence: 1.0,
            });
            elapsed += duration;
        }

        if segments.is_empty() {
            tracing::error!("No measurable narration among {} artifacts", artifacts.len());
            return Err(SubtitleError::NoValidSegments);
        }

        tracing::info!(
            "Timed {}/{} narration segments, timeline ends at {:.3}s",
            segments.len(),
            artifacts.len(),
            segments.last().map(|s| s.end_secs).unwrap_or_default()
        );

        Ok(segments)
    }

    /// Turn timed narration into caption cues.
    ///
    /// Segments no longer than `max_subtitle_secs` get one cue. Longer ones
    /// are cut into `ceil(duration / max_subtitle_secs)` equal time slices
    /// with words spread evenly and the remainder on the last piece. The last
    /// piece always ends exactly at the segment end. A slice that gets no
    /// words is left without a cue, so no cue is blank or longer than the
    /// maximum.
    pub fn create_subtitle_segments(
        &self,
        segments: &[AudioSegmentInfo],
        max_subtitle_secs: f64,
    ) -> SubtitleResult<Vec<SubtitleSegment>> {
        if !(max_subtitle_secs.is_finite() && max_subtitle_secs > 0.0) {
            return Err(SubtitleError::InvalidOption {
                name: "max_subtitle_secs",
                value: max_subtitle_secs.to_string(),
            });
        }

        let mut cues = Vec::new();

        for segment in segments {
            if segment.duration_secs <= max_subtitle_secs {
                cues.push(SubtitleSegment {
                    start_secs: segment.start_secs,
                    end_secs: segment.end_secs,
                    text: self.wrap(&segment.text),
                    source_audio: segment.path.clone(),
                    split_method: SplitMethod::Single,
                });
                continue;
            }

            let words: Vec<&str> = segment.text.split_whitespace().collect();
            let pieces = ((segment.duration_secs / max_subtitle_secs).ceil() as usize).max(1);
            let slice = segment.duration_secs / pieces as f64;
            let per_piece = words.len() / pieces;

            if per_piece == 0 {
                tracing::debug!(
                    "Segment {} has {} words for {} pieces, only the last piece gets a cue",
                    segment.path.display(),
                    words.len(),
                    pieces
                );
            }

            for k in 0..pieces {
                let last = k + 1 == pieces;
                let first_word = k * per_piece;
                let piece_words = if last {
                    &words[first_word..]
                } else {
                    &words[first_word..first_word + per_piece]
                };
                if piece_words.is_empty() && !last {
                    continue;
                }

                let start = segment.start_secs + k as f64 * slice;
                let end = if last {
                    segment.end_secs
                } else {
                    segment.start_secs + (k + 1) as f64 * slice
                };

                cues.push(SubtitleSegment {
                    start_secs: start,
                    end_secs: end,
                    text: self.wrap(&piece_words.join(" ")),
                    source_audio: segment.path.clone(),
                    split_method: if pieces > 1 {
                        SplitMethod::EvenSplit
                    } else {
                        SplitMethod::Single
                    },
                });
            }
        }

        Ok(cues)
    }

    /// Measure the artifacts and build cues with the configured limits.
    pub fn generate(
        &self,
        artifacts: &[PathBuf],
        texts: &[String],
    ) -> SubtitleResult<Vec<SubtitleSegment>> {
        let timed = self.analyze_audio_segments(artifacts, texts)?;
        self.create_subtitle_segments(&timed, self.settings.max_subtitle_secs)
    }

    /// Write `<stem>.srt` and `<stem>.vtt` from the same cues.
    pub fn write_outputs(
        &self,
        cues: &[SubtitleSegment],
        stem: &Path,
    ) -> SubtitleResult<(PathBuf, PathBuf)> {
        let options = WriteOptions {
            rounding: self.settings.rounding,
        };
        let srt = stem.with_extension(SubtitleFormat::Srt.extension());
        let vtt = stem.with_extension(SubtitleFormat::WebVtt.extension());

        write_subtitle_file(cues, &srt, &options)?;
        write_subtitle_file(cues, &vtt, &options)?;

        Ok((srt, vtt))
    }

    fn wrap(&self, text: &str) -> String {
        format_subtitle_text(text, self.settings.max_chars_per_line, self.settings.max_lines).text()
    }
}
