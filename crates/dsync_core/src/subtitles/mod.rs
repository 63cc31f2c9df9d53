//! Caption timing derived from measured narration.
//!
//! # Components
//!
//! - **generator**: places narration on the timeline and cuts it into cues
//! - **wrap**: greedy line wrapping with overflow accounting
//! - **writers**: SRT and WebVTT rendering
//! - **types**: segments, cues, formats and rounding
//!
//! # Usage
//!
//! ```ignore
//! use dsync_core::audio::AudioProcessor;
//! use dsync_core::subtitles::SubtitleGenerator;
//!
//! let generator = SubtitleGenerator::new(AudioProcessor::with_ffmpeg(&settings), &settings.subtitles);
//! let timed = generator.analyze_audio_segments(&narration_files, &segment_texts)?;
//! let cues = generator.create_subtitle_segments(&timed, settings.subtitles.max_subtitle_secs)?;
//! generator.write_outputs(&cues, &work_dir.join("captions"))?;
//! ```

mod error;
mod generator;
mod types;
mod wrap;
pub mod writers;

pub use error::{SubtitleError, SubtitleResult};
pub use generator::SubtitleGenerator;
pub use types::{
    AudioSegmentInfo, RoundingMode, SubtitleFormat, SubtitleSegment, WrappedText, WriteOptions,
};
pub use wrap::format_subtitle_text;
pub use writers::{format_srt_time, format_vtt_time, write_srt, write_subtitle_file, write_vtt};
