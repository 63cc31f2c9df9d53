//! Checkpoint ledger entries and the values computed from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::Metadata;
use crate::models::{ComponentKind, Deviation};

/// One stage result. Appended to the ledger, never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationCheckpoint {
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    pub target: f64,
    pub actual: f64,
    pub component: ComponentKind,
    pub within_tolerance: bool,
    pub deviation: Deviation,
    /// Whether `stage` was in the critical set when recorded.
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub details: Metadata,
}

impl DurationCheckpoint {
    /// Out of tolerance on a critical stage.
    pub fn is_critical_failure(&self) -> bool {
        self.critical && !self.within_tolerance
    }
}

/// Outcome of a quality gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub can_proceed: bool,
    pub message: String,
}

/// Summary of the ledger at some stage. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationFeedback {
    pub stage: String,
    /// Fraction of all checkpoints within tolerance (1.0 when empty).
    pub quality_score: f64,
    pub can_proceed: bool,
    pub must_regenerate: bool,
    pub recommendations: Vec<String>,
}

/// Producer parameter an adjustment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTarget {
    /// Narration speaking rate.
    SpeechRate,
    /// Script word budget.
    WordCount,
    /// Length of each visual clip.
    ClipDuration,
}

impl std::fmt::Display for AdjustmentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentTarget::SpeechRate => write!(f, "speech_rate"),
            AdjustmentTarget::WordCount => write!(f, "word_count"),
            AdjustmentTarget::ClipDuration => write!(f, "clip_duration"),
        }
    }
}

/// Numeric directive for a producer's next attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub component: ComponentKind,
    pub target: AdjustmentTarget,
    /// Multiply the current parameter by this.
    pub multiplier: f64,
    pub reason: String,
}
