//! Duration feedback: checkpoint ledger, quality gates and adjustments.
//!
//! # Components
//!
//! - **system**: `FeedbackSystem`, which owns the run's `DurationAuthority`
//!   and an append-only ledger of stage checkpoints
//! - **types**: checkpoints, gate decisions, feedback summaries and
//!   adjustment directives
//!
//! # Usage
//!
//! ```ignore
//! let mut feedback = FeedbackSystem::new(authority, &settings.feedback)?;
//!
//! let gate = feedback.apply_quality_gate("audio_generation", measured, ComponentKind::Audio);
//! if !gate.can_proceed {
//!     if let Some(adj) = feedback.suggest_adjustments(ComponentKind::Audio) {
//!         // retry narration with the speech rate scaled by adj.multiplier
//!     }
//! }
//! ```

mod error;
mod system;
mod types;

pub use error::{FeedbackError, FeedbackResult};
pub use system::FeedbackSystem;
pub use types::{Adjustment, AdjustmentTarget, DurationCheckpoint, DurationFeedback, GateDecision};
