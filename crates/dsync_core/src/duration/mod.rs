//! Duration authority and script contract.
//!
//! # Components
//!
//! - **authority**: target/tolerance band, append-only report log,
//!   recommendation policy and final validation
//! - **contract**: trims oversized scripts at sentence boundaries
//! - **types**: reports, constraints and validation results
//!
//! # Usage
//!
//! ```ignore
//! use dsync_core::duration::{DurationAuthority, DurationContract, Metadata};
//! use dsync_core::models::ComponentKind;
//!
//! let mut authority = DurationAuthority::with_target(30.0, 0.05)?;
//! let budget = authority.generation_constraints().max_words;
//!
//! let contract = DurationContract::from_authority(&authority);
//! let script = contract.enforce_on_script(&text, estimated_secs);
//!
//! authority.register(ComponentKind::Script, estimated_secs, 0.7, Metadata::new());
//! authority.register_measured(ComponentKind::Audio, measured_secs);
//! let final_secs = authority.final_duration_recommendation();
//! ```

mod authority;
mod contract;
mod error;
mod types;

pub use authority::DurationAuthority;
pub use contract::{DurationContract, ScriptEnforcement};
pub use error::{DurationError, DurationResult};
pub use types::{
    latest_durations, ComponentDurationMap, DurationReport, GenerationConstraints, Metadata,
    ValidationIssue, ValidationReport,
};
