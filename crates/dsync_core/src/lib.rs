//! DSync Core - duration coordination for multi-stage media generation.
//!
//! Independently produced artifacts (script, narration audio, captions,
//! visual clips, final composite) are reported here so they converge on one
//! target length. The crate records, validates and arbitrates durations; it
//! does not generate content or sequence pipeline stages.
//!
//! # Components
//!
//! - **audio**: probing, normalization, stream-copy concatenation and muxing
//!   through an injected media tool
//! - **subtitles**: audio-first caption timing plus SRT/VTT writers
//! - **duration**: the per-run authority, generation constraints and the
//!   script trimming contract
//! - **feedback**: checkpoint ledger, quality gates and adjustment hints
//! - **run**: per-run context tying the above together

pub mod audio;
pub mod config;
pub mod duration;
pub mod feedback;
pub mod logging;
pub mod models;
pub mod run;
pub mod subtitles;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
