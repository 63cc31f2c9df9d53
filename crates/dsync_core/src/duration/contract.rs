//! Script trimming contract.
//!
//! Oversized scripts are cut back to the authority's ceiling. Cuts only ever
//! happen between sentences.

use super::authority::DurationAuthority;

/// Outcome of enforcing the contract on a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEnforcement {
    /// The script to use (unchanged when no trim was needed).
    pub text: String,
    pub trimmed: bool,
    pub original_words: usize,
    pub kept_words: usize,
    pub dropped_sentences: usize,
}

/// Trimming policy derived from a duration authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationContract {
    max_allowed_secs: f64,
    words_per_second: f64,
}

impl DurationContract {
    /// Derive the contract from the authority's band and narration speed.
    pub fn from_authority(authority: &DurationAuthority) -> Self {
        Self {
            max_allowed_secs: authority.band().max(),
            words_per_second: authority.settings().words_per_second,
        }
    }

    pub fn max_allowed_secs(&self) -> f64 {
        self.max_allowed_secs
    }

    /// Estimate spoken duration from the word count.
    pub fn estimate_duration(&self, text: &str) -> f64 {
        text.split_whitespace().count() as f64 / self.words_per_second
    }

    /// Trim `text` so its estimated duration fits under the ceiling.
    ///
    /// No-op when `estimated_secs` already fits. Otherwise whole sentences are
    /// kept, in order, until the next one would push the word count past
    /// `floor(word_count · max_allowed / estimated)`.
    pub fn enforce_on_script(&self, text: &str, estimated_secs: f64) -> ScriptEnforcement {
        let original_words = text.split_whitespace().count();

        if estimated_secs <= self.max_allowed_secs {
            return ScriptEnforcement {
                text: text.to_string(),
                trimmed: false,
                original_words,
                kept_words: original_words,
                dropped_sentences: 0,
            };
        }

        let ratio = self.max_allowed_secs / estimated_secs;
        let target_words = (original_words as f64 * ratio).floor() as usize;

        let sentences = split_sentences(text);
        let mut kept: Vec<&str> = Vec::new();
        let mut kept_words = 0;

        for sentence in &sentences {
            let words = sentence.split_whitespace().count();
            if kept_words + words > target_words {
                break;
            }
            kept_words += words;
            kept.push(sentence);
        }

        let dropped_sentences = sentences.len() - kept.len();
        let mut trimmed_text = kept.join(" ");
        let closed = trimmed_text.trim_end_matches(is_closer);
        if !closed.is_empty() && !closed.ends_with(is_terminal) {
            trimmed_text.push('.');
        }

        if trimmed_text.is_empty() {
            tracing::warn!(
                "Script trim to {} words left no complete sentence ({} words, {:.2}s estimated)",
                target_words,
                original_words,
                estimated_secs
            );
        } else {
            tracing::info!(
                "Trimmed script from {} to {} words ({} sentences dropped) to fit {:.2}s",
                original_words,
                kept_words,
                dropped_sentences,
                self.max_allowed_secs
            );
        }

        ScriptEnforcement {
            text: trimmed_text,
            trimmed: true,
            original_words,
            kept_words,
            dropped_sentences,
        }
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into trimmed sentences, each keeping its terminal punctuation.
///
/// A run of `.`, `!` or `?` (plus any closing quotes or brackets) ends a
/// sentence only when whitespace or the end of the text follows it, so
/// "3.5" or "e.g." mid-word stays inside its sentence. A trailing fragment
/// without punctuation counts as a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        // Keep runs like "?!" or "..." together
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminal(next) && !is_closer(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        match chars.peek() {
            Some(&(_, next)) if !next.is_whitespace() => continue,
            _ => {}
        }

        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Metadata;
    use crate::models::ComponentKind;

    /// Ten four-word sentences, forty words.
    fn forty_word_script() -> String {
        (1..=10)
            .map(|i| format!("Sentence number {} here.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn contract(target: f64) -> DurationContract {
        DurationContract::from_authority(&DurationAuthority::with_target(target, 0.05).unwrap())
    }

    #[test]
    fn split_sentences_keeps_punctuation() {
        let parts = split_sentences("One two. Three?! Four five... trailing words");
        assert_eq!(parts, vec!["One two.", "Three?!", "Four five...", "trailing words"]);
    }

    #[test]
    fn decimals_and_inner_dots_do_not_end_sentences() {
        let parts = split_sentences("Revenue grew 3.5 percent. See example.com today! \"Quoted.\" Done");
        assert_eq!(
            parts,
            vec!["Revenue grew 3.5 percent.", "See example.com today!", "\"Quoted.\"", "Done"]
        );
    }

    #[test]
    fn trim_keeps_sentence_with_decimal_whole() {
        let c = contract(2.0);
        let script = "Revenue grew 3.5 percent this quarter overall. Costs fell sharply too.";

        // 11 words, budget floor(11 * 2.1 / 3.0) = 7
        let result = c.enforce_on_script(script, 3.0);
        assert_eq!(result.text, "Revenue grew 3.5 percent this quarter overall.");
        assert_eq!(result.kept_words, 7);

        // Budget of 5 cannot hold the first sentence, so nothing is kept
        let result = c.enforce_on_script(script, 4.4);
        assert!(result.text.is_empty());
    }

    #[test]
    fn fitting_script_is_untouched() {
        let c = contract(30.0);
        let text = "Short script. Nothing to do";
        let result = c.enforce_on_script(text, 10.0);
        assert!(!result.trimmed);
        assert_eq!(result.text, text);
    }

    #[test]
    fn trims_at_sentence_boundary() {
        let c = contract(15.0);
        let script = forty_word_script();

        let result = c.enforce_on_script(&script, 16.0);

        // floor(40 * 15.75 / 16) = 39 words allowed, so nine sentences fit
        assert!(result.trimmed);
        assert_eq!(result.kept_words, 36);
        assert_eq!(result.dropped_sentences, 1);
        assert!(result.text.ends_with("Sentence number 9 here."));
        assert!(script.starts_with(&result.text));
    }

    #[test]
    fn never_cuts_mid_sentence() {
        let c = contract(10.0);
        let script = "Alpha beta gamma delta epsilon. Zeta eta theta iota kappa lambda mu. Nu xi.";
        let result = c.enforce_on_script(script, 20.0);

        for sentence in split_sentences(&result.text) {
            assert!(script.contains(sentence));
        }
        assert_eq!(result.text, "Alpha beta gamma delta epsilon.");
    }

    #[test]
    fn kept_prefix_ends_with_terminal_punctuation() {
        let c = contract(4.0);
        // 11 words, budget floor(11 * 4.2 / 6) = 7
        let result = c.enforce_on_script("Stop! Go now? Wait here please. And then an unfinished thought", 6.0);
        assert_eq!(result.text, "Stop! Go now? Wait here please.");
        assert!(result.text.ends_with(is_terminal));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let c = contract(15.0);
        let script = forty_word_script();

        let first = c.enforce_on_script(&script, c.estimate_duration(&script));
        let second = c.enforce_on_script(&first.text, c.estimate_duration(&first.text));

        assert!(first.trimmed);
        assert!(!second.trimmed);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn oversized_first_sentence_leaves_nothing() {
        let c = contract(2.0);
        let result = c.enforce_on_script("one two three four five six seven eight nine ten.", 4.0);
        assert!(result.trimmed);
        assert!(result.text.is_empty());
        assert_eq!(result.kept_words, 0);
    }

    #[test]
    fn scenario_trim_then_reregister() {
        let mut authority = DurationAuthority::with_target(15.0, 0.05).unwrap();
        let c = DurationContract::from_authority(&authority);
        let script = forty_word_script();

        assert!(!authority.register(ComponentKind::Script, 16.0, 0.7, Metadata::new()));

        let trimmed = c.enforce_on_script(&script, 16.0);
        let estimate = c.estimate_duration(&trimmed.text);
        assert!(authority.register(ComponentKind::Script, estimate, 0.7, Metadata::new()));

        // Re-estimating the trimmed text is stable and stays in band
        let again = c.enforce_on_script(&trimmed.text, estimate);
        assert!(!again.trimmed);
        assert!(authority.register(
            ComponentKind::Script,
            c.estimate_duration(&again.text),
            0.7,
            Metadata::new()
        ));
        assert!(authority.validate_final_result().valid);
    }
}
