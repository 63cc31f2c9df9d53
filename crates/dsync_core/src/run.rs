//! Per-run context.
//!
//! One generation run owns one duration authority, one checkpoint ledger
//! and one temp directory under `paths.temp_root`. Nothing is shared
//! between runs, so concurrent runs only need separate contexts. Stage
//! ordering is still the caller's job.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;

use crate::audio::{AudioProcessor, MediaTool};
use crate::config::Settings;
use crate::duration::{DurationAuthority, DurationError, Metadata, ValidationReport};
use crate::feedback::{DurationFeedback, FeedbackError, FeedbackSystem, GateDecision};
use crate::models::ComponentKind;
use crate::subtitles::SubtitleGenerator;

/// Stage name used for the end-of-run feedback summary.
const FINAL_STAGE: &str = "final";

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error("Failed to create run directory '{}': {source}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RunResult<T> = Result<T, RunError>;

/// Everything the caller needs once all stages have reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub recommended_duration: f64,
    pub validation: ValidationReport,
    pub feedback: DurationFeedback,
}

/// State for one generation run.
#[derive(Debug)]
pub struct RunContext {
    run_id: String,
    settings: Settings,
    feedback: FeedbackSystem,
    work_dir: TempDir,
}

impl RunContext {
    /// Start a run with a timestamped id.
    pub fn new(settings: &Settings) -> RunResult<Self> {
        let run_id = format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f"));
        Self::with_id(settings, run_id)
    }

    /// Start a run with an explicit id.
    pub fn with_id(settings: &Settings, run_id: impl Into<String>) -> RunResult<Self> {
        let run_id = run_id.into();
        let authority = DurationAuthority::new(&settings.duration)?;
        let feedback = FeedbackSystem::new(authority, &settings.feedback)?;

        let temp_root = PathBuf::from(&settings.paths.temp_root);
        let work_dir = std::fs::create_dir_all(&temp_root)
            .and_then(|_| {
                tempfile::Builder::new()
                    .prefix(&format!("{}-", run_id))
                    .tempdir_in(&temp_root)
            })
            .map_err(|source| RunError::WorkDir {
                path: temp_root.clone(),
                source,
            })?;

        tracing::info!(
            "Run {} started: {} in {}",
            run_id,
            feedback.authority().band(),
            work_dir.path().display()
        );

        Ok(Self {
            run_id,
            settings: settings.clone(),
            feedback,
            work_dir,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Scratch directory for this run, removed when the context drops.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn authority(&self) -> &DurationAuthority {
        self.feedback.authority()
    }

    pub fn authority_mut(&mut self) -> &mut DurationAuthority {
        self.feedback.authority_mut()
    }

    pub fn feedback(&self) -> &FeedbackSystem {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut FeedbackSystem {
        &mut self.feedback
    }

    /// Audio processor over `tool`, with temp files inside this run.
    pub fn audio_processor(&self, tool: Arc<dyn MediaTool>) -> AudioProcessor {
        AudioProcessor::new(tool, &self.settings.audio, self.work_dir())
    }

    /// Audio processor backed by ffmpeg/ffprobe.
    pub fn ffmpeg_processor(&self) -> AudioProcessor {
        AudioProcessor::with_ffmpeg(&self.settings).with_temp_root(self.work_dir())
    }

    pub fn subtitle_generator(&self, audio: AudioProcessor) -> SubtitleGenerator {
        SubtitleGenerator::new(audio, &self.settings.subtitles)
    }

    /// Register a stage result with the authority and run its quality gate.
    pub fn record_stage(
        &mut self,
        stage: &str,
        kind: ComponentKind,
        duration: f64,
        confidence: f64,
        metadata: Metadata,
    ) -> GateDecision {
        self.feedback
            .authority_mut()
            .register(kind, duration, confidence, metadata);
        self.feedback.apply_quality_gate(stage, duration, kind)
    }

    /// Recommended duration, final validation and ledger summary.
    ///
    /// Audit logs go to `<logs_folder>/<run_id>/` when
    /// `logging.write_audit_logs` is set.
    pub fn finalize(&self) -> RunResult<RunSummary> {
        let authority = self.feedback.authority();
        let summary = RunSummary {
            run_id: self.run_id.clone(),
            recommended_duration: authority.final_duration_recommendation(),
            validation: authority.validate_final_result(),
            feedback: self.feedback.feedback(FINAL_STAGE),
        };

        if self.settings.logging.write_audit_logs {
            let dir = Path::new(&self.settings.paths.logs_folder).join(&self.run_id);
            self.export_audit(&dir)?;
        }

        tracing::info!(
            "Run {} finalized: {:.2}s recommended, valid={}, quality {:.2}",
            self.run_id,
            summary.recommended_duration,
            summary.validation.valid,
            summary.feedback.quality_score
        );

        Ok(summary)
    }

    /// Write `durations.json` and `checkpoints.jsonl` into `dir`.
    pub fn export_audit(&self, dir: &Path) -> RunResult<(PathBuf, PathBuf)> {
        let durations = dir.join("durations.json");
        let checkpoints = dir.join("checkpoints.jsonl");

        self.feedback.authority().write_audit_log(&durations)?;
        self.feedback.write_audit_log(&checkpoints)?;

        Ok((durations, checkpoints))
    }
}
