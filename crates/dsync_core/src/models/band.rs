//! Target duration and its symmetric tolerance band.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid band parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BandError {
    #[error("Target duration must be a positive number of seconds, got {0}")]
    InvalidTarget(f64),

    #[error("Tolerance must lie strictly between 0 and 1, got {0}")]
    InvalidTolerance(f64),
}

/// Where a duration falls relative to the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    TooShort,
    WithinTolerance,
    TooLong,
}

/// `[target·(1−p), target·(1+p)]`, fixed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    target: f64,
    tolerance: f64,
    min: f64,
    max: f64,
}

impl ToleranceBand {
    /// Build a band, rejecting non-positive targets and tolerances outside (0, 1).
    pub fn new(target: f64, tolerance: f64) -> Result<Self, BandError> {
        if !target.is_finite() || target <= 0.0 {
            return Err(BandError::InvalidTarget(target));
        }
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(BandError::InvalidTolerance(tolerance));
        }

        Ok(Self {
            target,
            tolerance,
            min: target * (1.0 - tolerance),
            max: target * (1.0 + tolerance),
        })
    }

    /// Target duration in seconds.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Tolerance fraction.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Lower bound in seconds.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound in seconds.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Inclusive membership test.
    pub fn contains(&self, duration: f64) -> bool {
        self.min <= duration && duration <= self.max
    }

    pub fn classify(&self, duration: f64) -> Deviation {
        if duration < self.min {
            Deviation::TooShort
        } else if duration > self.max {
            Deviation::TooLong
        } else {
            Deviation::WithinTolerance
        }
    }

    /// Signed deviation from the target as a percentage.
    pub fn deviation_pct(&self, duration: f64) -> f64 {
        (duration - self.target) / self.target * 100.0
    }
}

impl std::fmt::Display for ToleranceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2}s ±{:.1}% ({:.2}s - {:.2}s)",
            self.target,
            self.tolerance * 100.0,
            self.min,
            self.max
        )
    }
}
