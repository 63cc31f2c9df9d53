//! Greedy caption line wrapping.

use super::types::WrappedText;

/// Wrap `text` into at most `max_lines` lines of `max_chars_per_line`.
///
/// Words are placed greedily. A single word longer than the line width
/// gets a line of its own. Words that do not fit in `max_lines` are
/// dropped and counted in `dropped_words`; a warning is logged when that
/// happens.
pub fn format_subtitle_text(text: &str, max_chars_per_line: usize, max_lines: usize) -> WrappedText {
    let words: Vec<&str> = text.split_whitespace().collect();

    if max_lines == 0 {
        return WrappedText {
            lines: Vec::new(),
            dropped_words: words.len(),
        };
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut dropped_words = 0;

    for (i, word) in words.iter().enumerate() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        if current.chars().count() + 1 + word.chars().count() <= max_chars_per_line {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        lines.push(std::mem::take(&mut current));
        if lines.len() == max_lines {
            dropped_words = words.len() - i;
            break;
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if dropped_words > 0 {
        tracing::warn!(
            "Caption overflow: dropped {} of {} words ({} lines x {} chars)",
            dropped_words,
            words.len(),
            max_lines,
            max_chars_per_line
        );
    }

    WrappedText {
        lines,
        dropped_words,
    }
}
