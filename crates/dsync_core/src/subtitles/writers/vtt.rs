//! WebVTT subtitle writer.

use super::srt::split_millis;
use crate::subtitles::types::{RoundingMode, SubtitleSegment, WriteOptions};

/// Write segments as a WebVTT string.
pub fn write_vtt(segments: &[SubtitleSegment], options: &WriteOptions) -> String {
    let mut output = String::from("WEBVTT\n");

    for segment in segments {
        output.push('\n');

        let start = format_vtt_time(segment.start_secs * 1000.0, options.rounding);
        let end = format_vtt_time(segment.end_secs * 1000.0, options.rounding);
        output.push_str(&format!("{} --> {}\n", start, end));

        output.push_str(&segment.text);
        output.push('\n');
    }

    output
}

/// Format milliseconds as WebVTT timestamp (HH:MM:SS.mmm).
pub fn format_vtt_time(ms: f64, rounding: RoundingMode) -> String {
    let (hours, mins, secs, millis) = split_millis(ms, rounding);
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}
