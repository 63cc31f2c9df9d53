//! Deterministic media tool for tests.
//!
//! Artifacts are small text files holding their duration in seconds, so
//! plain file copies keep their duration. Nothing here spawns a process.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::error::{AudioError, AudioResult};
use super::tool::MediaTool;
use super::types::{AudioProbe, CanonicalFormat};

#[derive(Default)]
pub(crate) struct FakeMediaTool {
    /// Inputs whose transcoded output probes as zero.
    broken_transcodes: Mutex<HashSet<PathBuf>>,
    /// Paths whose probe hangs until the runner kills it.
    hanging: Mutex<HashSet<PathBuf>>,
    /// Added to every concatenated output.
    concat_drift: f64,
    calls: Mutex<Vec<String>>,
}

impl FakeMediaTool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_concat_drift(mut self, drift: f64) -> Self {
        self.concat_drift = drift;
        self
    }

    /// Create `dir/name` with the given duration.
    pub(crate) fn add_file(&self, dir: &Path, name: &str, duration: f64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, duration.to_string()).unwrap();
        path
    }

    /// Create `dir/name` that ffprobe would reject.
    pub(crate) fn add_corrupt_file(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "garbage").unwrap();
        path
    }

    pub(crate) fn break_transcode(&self, input: &Path) {
        self.broken_transcodes.lock().insert(input.to_path_buf());
    }

    pub(crate) fn hang_on(&self, path: &Path) {
        self.hanging.lock().insert(path.to_path_buf());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn duration_of(&self, path: &Path) -> AudioResult<f64> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }
        let content =
            fs::read_to_string(path).map_err(|e| AudioError::io_error("fake probe", e))?;
        content
            .trim()
            .parse()
            .map_err(|_| AudioError::command_failed("ffprobe", 1, "Invalid data found"))
    }

    fn write_output(&self, output: &Path, duration: f64) -> AudioResult<()> {
        fs::write(output, duration.to_string()).map_err(|e| AudioError::io_error("fake output", e))
    }
}

impl MediaTool for FakeMediaTool {
    fn probe(&self, path: &Path) -> AudioResult<AudioProbe> {
        self.calls.lock().push(format!("probe {}", path.display()));
        if self.hanging.lock().contains(path) {
            return Err(AudioError::Timeout {
                tool: "ffprobe".to_string(),
                seconds: 300,
            });
        }
        let duration = self.duration_of(path)?;
        Ok(AudioProbe::with_duration(path, duration))
    }

    fn transcode(&self, input: &Path, output: &Path, format: &CanonicalFormat) -> AudioResult<()> {
        self.calls.lock().push(format!(
            "transcode {}Hz {}ch {}",
            format.sample_rate, format.channels, format.codec
        ));
        let duration = if self.broken_transcodes.lock().contains(input) {
            0.0
        } else {
            self.duration_of(input)?
        };
        self.write_output(output, duration)
    }

    fn concat(&self, inputs: &[PathBuf], output: &Path) -> AudioResult<()> {
        self.calls.lock().push(format!("concat {}", inputs.len()));
        let mut total = 0.0;
        for input in inputs {
            total += self.duration_of(input)?;
        }
        self.write_output(output, total + self.concat_drift)
    }

    fn mux(
        &self,
        _video: &Path,
        _audio: &Path,
        output: &Path,
        duration_secs: f64,
        _format: &CanonicalFormat,
    ) -> AudioResult<()> {
        self.calls.lock().push(format!("mux {:.3}", duration_secs));
        self.write_output(output, duration_secs)
    }
}
