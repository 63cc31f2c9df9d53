//! Audio probing, normalization, concatenation and muxing.
//!
//! Measured durations from this module are the ground truth every other
//! component defers to.
//!
//! # Components
//!
//! - **tool**: `MediaTool` trait and the ffmpeg/ffprobe implementation
//! - **runner**: external command execution with a wall-clock timeout
//! - **processor**: normalize-then-stream-copy pipeline over a `MediaTool`
//! - **types**: probe results, canonical format and operation reports

mod error;
mod processor;
mod runner;
mod tool;
mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use error::{AudioError, AudioResult};
pub use processor::AudioProcessor;
pub use runner::{ToolOutput, ToolRunner};
pub use tool::{FfmpegTool, MediaTool};
pub use types::{
    AudioProbe, CanonicalFormat, ConcatReport, MuxReport, MuxTruncation, NormalizedSegment,
    NormalizedSet, ProbeOutcome,
};
