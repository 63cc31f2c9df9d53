//! Report, constraint and validation types for the duration authority.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ComponentKind, Deviation};

/// Free-form metadata attached to a report.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Latest reported duration per component kind.
pub type ComponentDurationMap = BTreeMap<ComponentKind, f64>;

/// One duration report from a pipeline stage. Never mutated once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationReport {
    pub kind: ComponentKind,
    /// Target at the time of the report.
    pub target: f64,
    /// Reported duration in seconds.
    pub duration: f64,
    /// 1.0 for measured durations, lower for estimates.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    pub timestamp: DateTime<Utc>,
}

impl DurationReport {
    /// Whether the duration came from probing a real artifact.
    pub fn is_measured(&self) -> bool {
        self.confidence >= 1.0
    }
}

/// Derive the latest-value view from a report log (last write wins).
pub fn latest_durations(log: &[DurationReport]) -> ComponentDurationMap {
    log.iter().map(|r| (r.kind, r.duration)).collect()
}

/// Advisory upper bounds handed to producers before content exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConstraints {
    pub target_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
    /// Word budget for the script (`target · words/s · safety factor`).
    pub max_words: usize,
    /// Narration segments of at least the minimum segment length.
    pub max_segments: usize,
    /// Visual clips of at most the maximum segment length, plus one.
    pub max_clips: usize,
}

/// A problem found by final validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationIssue {
    OutOfTolerance {
        kind: ComponentKind,
        duration: f64,
        min: f64,
        max: f64,
        deviation: Deviation,
    },
    SyncMismatch {
        audio: f64,
        subtitles: f64,
        difference: f64,
        threshold: f64,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::OutOfTolerance {
                kind,
                duration,
                min,
                max,
                ..
            } => write!(
                f,
                "{} duration {:.2}s is outside tolerance ({:.2}s - {:.2}s)",
                kind, duration, min, max
            ),
            ValidationIssue::SyncMismatch {
                audio,
                subtitles,
                difference,
                threshold,
            } => write!(
                f,
                "Sync mismatch: audio {:.2}s vs subtitles {:.2}s differs by {:.2}s (threshold {:.2}s)",
                audio, subtitles, difference, threshold
            ),
        }
    }
}

/// Outcome of `validate_final_result`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Build a report; valid when there are no issues.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// Whether any issue is a sync mismatch.
    pub fn has_sync_mismatch(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::SyncMismatch { .. }))
    }
}
