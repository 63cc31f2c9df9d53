//! SRT subtitle writer.
//!
//! # Timing Precision
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Segment times in seconds are
//! rounded according to the configured RoundingMode at write time.

use crate::subtitles::types::{RoundingMode, SubtitleSegment, WriteOptions};

/// Write segments as an SRT string.
///
/// Cues are numbered from 1 and separated by a blank line.
pub fn write_srt(segments: &[SubtitleSegment], options: &WriteOptions) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        output.push_str(&format!("{}\n", i + 1));

        let start = format_srt_time(segment.start_secs * 1000.0, options.rounding);
        let end = format_srt_time(segment.end_secs * 1000.0, options.rounding);
        output.push_str(&format!("{} --> {}\n", start, end));

        output.push_str(&segment.text);
        output.push('\n');
    }

    output
}

/// Format milliseconds as SRT timestamp (HH:MM:SS,mmm).
pub fn format_srt_time(ms: f64, rounding: RoundingMode) -> String {
    let (hours, mins, secs, millis) = split_millis(ms, rounding);
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Round and split milliseconds into (hours, minutes, seconds, millis).
pub(super) fn split_millis(ms: f64, rounding: RoundingMode) -> (u64, u64, u64, u64) {
    let ms = rounding.apply(ms).max(0.0) as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    (hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SplitMethod;
    use std::path::PathBuf;

    fn segment(start: f64, end: f64, text: &str) -> SubtitleSegment {
        SubtitleSegment {
            start_secs: start,
            end_secs: end,
            text: text.to_string(),
            source_audio: PathBuf::from("seg.mp3"),
            split_method: SplitMethod::Single,
        }
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0, RoundingMode::Round), "00:00:00,000");
        assert_eq!(format_srt_time(1500.0, RoundingMode::Round), "00:00:01,500");
        assert_eq!(format_srt_time(60000.0, RoundingMode::Round), "00:01:00,000");
        assert_eq!(format_srt_time(3600000.0, RoundingMode::Round), "01:00:00,000");

        assert_eq!(format_srt_time(1234.5, RoundingMode::Floor), "00:00:01,234");
        assert_eq!(format_srt_time(1234.5, RoundingMode::Round), "00:00:01,235");
        assert_eq!(format_srt_time(-5.0, RoundingMode::Round), "00:00:00,000");
    }

    #[test]
    fn float_noise_rounds_to_intended_millisecond() {
        // 2.3 + 0.3 is 2.5999999999999996 in binary floating point
        assert_eq!(format_srt_time((2.3 + 0.3) * 1000.0, RoundingMode::Round), "00:00:02,600");
    }

    #[test]
    fn test_write_basic_srt() {
        let segments = vec![
            segment(1.0, 4.0, "Hello, world!"),
            segment(5.0, 8.0, "Two\nlines"),
        ];

        let output = write_srt(&segments, &WriteOptions::default());

        let expected = "1\n00:00:01,000 --> 00:00:04,000\nHello, world!\n\n2\n00:00:05,000 --> 00:00:08,000\nTwo\nlines\n";
        assert_eq!(output, expected);
    }
}
