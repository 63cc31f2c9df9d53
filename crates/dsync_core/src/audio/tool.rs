//! Media tool interface and its ffmpeg/ffprobe implementation.
//!
//! The processor only talks to `MediaTool`, so tests can substitute a
//! deterministic fake for the real binaries.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde_json::Value;
use tempfile::NamedTempFile;

use super::error::{AudioError, AudioResult};
use super::runner::ToolRunner;
use super::types::{AudioProbe, CanonicalFormat};
use crate::config::AudioSettings;

/// Codec used for the audio track when muxing; video is always copied.
const MUX_AUDIO_CODEC: &str = "aac";

/// External probe/transcode/concat/mux operations.
pub trait MediaTool: Send + Sync {
    /// Measure an artifact's duration and stream properties.
    fn probe(&self, path: &Path) -> AudioResult<AudioProbe>;

    /// Transcode `input` to `format`, writing `output`.
    fn transcode(&self, input: &Path, output: &Path, format: &CanonicalFormat) -> AudioResult<()>;

    /// Join `inputs` in order by stream copy (no re-encoding, no blending).
    fn concat(&self, inputs: &[PathBuf], output: &Path) -> AudioResult<()>;

    /// Combine the first video and first audio stream, cut to `duration_secs`.
    fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        duration_secs: f64,
        format: &CanonicalFormat,
    ) -> AudioResult<()>;
}

/// `MediaTool` backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    runner: ToolRunner,
}

impl FfmpegTool {
    /// Build from audio settings (empty paths fall back to PATH lookup).
    pub fn new(settings: &AudioSettings) -> Self {
        Self {
            ffmpeg: tool_path(&settings.ffmpeg_path, "ffmpeg"),
            ffprobe: tool_path(&settings.ffprobe_path, "ffprobe"),
            runner: ToolRunner::new(Duration::from_secs(settings.tool_timeout_secs)),
        }
    }

    /// Replace the runner (timeout, command logging).
    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// ffmpeg invocation with the flags every call shares.
    fn ffmpeg_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-hide_banner", "-nostdin", "-loglevel", "error"]);
        cmd
    }

    fn ensure_parent(output: &Path) -> AudioResult<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AudioError::io_error("creating output directory", e))?;
            }
        }
        Ok(())
    }
}

fn tool_path(configured: &str, default: &str) -> PathBuf {
    if configured.trim().is_empty() {
        PathBuf::from(default)
    } else {
        PathBuf::from(configured)
    }
}

impl MediaTool for FfmpegTool {
    fn probe(&self, path: &Path) -> AudioResult<AudioProbe> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration,bit_rate:stream=codec_type,codec_name,sample_rate,channels,duration",
            "-of",
            "json",
        ])
        .arg(path);

        let output = self.runner.run("ffprobe", cmd)?;
        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AudioError::parse_error("ffprobe", e.to_string()))?;

        parse_probe_json(&json, path)
    }

    fn transcode(&self, input: &Path, output: &Path, format: &CanonicalFormat) -> AudioResult<()> {
        Self::ensure_parent(output)?;

        let mut cmd = self.ffmpeg_command();
        cmd.arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-ar")
            .arg(format.sample_rate.to_string())
            .arg("-ac")
            .arg(format.channels.to_string())
            .arg("-c:a")
            .arg(&format.codec)
            .arg("-b:a")
            .arg(&format.bitrate)
            .arg(output);

        self.runner.run("ffmpeg", cmd)?;
        Ok(())
    }

    fn concat(&self, inputs: &[PathBuf], output: &Path) -> AudioResult<()> {
        Self::ensure_parent(output)?;

        // Relative entries would resolve against the list file's directory
        let inputs: Vec<PathBuf> = inputs
            .iter()
            .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        // The list file lives exactly as long as this call
        let mut list = concat_list_file(output)?;
        list.write_all(concat_list_content(&inputs).as_bytes())
            .and_then(|_| list.flush())
            .map_err(|e| AudioError::io_error("writing concat list", e))?;

        let mut cmd = self.ffmpeg_command();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list.path())
            .args(["-c", "copy"])
            .arg(output);

        self.runner.run("ffmpeg", cmd)?;
        Ok(())
    }

    fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        duration_secs: f64,
        format: &CanonicalFormat,
    ) -> AudioResult<()> {
        Self::ensure_parent(output)?;

        let mut cmd = self.ffmpeg_command();
        cmd.arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"])
            .args(["-c:a", MUX_AUDIO_CODEC, "-b:a"])
            .arg(&format.bitrate)
            .arg("-t")
            .arg(format!("{:.3}", duration_secs))
            .arg("-shortest")
            .arg(output);

        self.runner.run("ffmpeg", cmd)?;
        Ok(())
    }
}

/// Empty list file next to `output`, inside the run's own directories.
fn concat_list_file(output: &Path) -> AudioResult<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix("dsync-concat-")
        .suffix(".txt")
        .tempfile_in(dir)
        .map_err(|e| AudioError::io_error("creating concat list", e))
}

/// Body of an ffmpeg concat-demuxer list file.
fn concat_list_content(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| {
            let escaped = p.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Parse `ffprobe -of json` output for one artifact.
fn parse_probe_json(json: &Value, path: &Path) -> AudioResult<AudioProbe> {
    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(|s| s.as_slice())
        .unwrap_or(&[]);

    let audio = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"));

    let has_video = streams
        .iter()
        .any(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"));

    // Container duration first, longest stream duration as fallback
    let duration_secs = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(number_field)
        .or_else(|| {
            streams
                .iter()
                .filter_map(|s| s.get("duration").and_then(number_field))
                .reduce(f64::max)
        })
        .ok_or_else(|| {
            AudioError::parse_error("ffprobe", format!("no duration for {}", path.display()))
        })?;

    let bit_rate = json
        .get("format")
        .and_then(|f| f.get("bit_rate"))
        .and_then(number_field)
        .map(|b| b as u64);

    Ok(AudioProbe {
        path: path.to_path_buf(),
        duration_secs,
        codec: audio
            .and_then(|s| s.get("codec_name"))
            .and_then(|c| c.as_str())
            .map(|c| c.to_string()),
        sample_rate: audio
            .and_then(|s| s.get("sample_rate"))
            .and_then(number_field)
            .map(|r| r as u32),
        channels: audio
            .and_then(|s| s.get("channels"))
            .and_then(|c| c.as_u64())
            .map(|c| c as u8),
        bit_rate,
        has_video,
    })
}

/// ffprobe reports most numbers as strings.
fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
