//! Word-boundary matching
//!
//! Decides whether a trigger fires on a message under a [`MatchMode`], and
//! where in the message it fired. Every comparison is case-insensitive and
//! accent-insensitive: both the message and the trigger go through
//! [`fold`](super::normalize::fold) first.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::config::MatchMode;
use super::normalize::fold;

/// Compiled size limit for one trigger pattern (the `regex` default)
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A trigger word prepared for repeated matching.
///
/// The regex for [`MatchMode::Contains`] is compiled once here instead of on
/// every message.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    word: String,
    folded: String,
    pattern: Option<Regex>,
}

impl WordMatcher {
    /// Prepare `word` for matching. A blank word never matches anything.
    pub fn new(word: impl Into<String>) -> Self {
        let word = word.into();
        let folded = fold(word.trim());
        let pattern = if folded.is_empty() {
            None
        } else {
            compile_pattern(&word, &folded, PATTERN_SIZE_LIMIT)
        };

        Self {
            word,
            folded,
            pattern,
        }
    }

    /// The trigger text as configured.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Whether the trigger fires on `text` under `mode`.
    pub fn matches(&self, text: &str, mode: MatchMode) -> bool {
        self.locate(text, mode).is_some()
    }

    /// Char offset of the match in `text`, or `None` if it does not match.
    ///
    /// - `Contains`: offset of the first whole-word occurrence in the folded text.
    /// - `StartsWith`: always 0.
    /// - `EndsWith`: `len(text) - len(last token)` measured on the original text.
    pub fn locate(&self, text: &str, mode: MatchMode) -> Option<usize> {
        if self.folded.is_empty() || text.trim().is_empty() {
            return None;
        }

        match mode {
            MatchMode::Contains => {
                let pattern = self.pattern.as_ref()?;
                let haystack = fold(text);
                let found = pattern.find(&haystack)?;
                Some(haystack[..found.start()].chars().count())
            }
            MatchMode::StartsWith => {
                let first = text.split_whitespace().next()?;
                (fold(first) == self.folded).then_some(0)
            }
            MatchMode::EndsWith => {
                let last = text.split_whitespace().next_back()?;
                if fold(last) != self.folded {
                    return None;
                }
                Some(text.chars().count() - last.chars().count())
            }
        }
    }
}

/// Whole-word pattern for an already folded trigger.
///
/// A trigger that cannot be compiled is reported and never matches.
fn compile_pattern(word: &str, folded: &str, size_limit: usize) -> Option<Regex> {
    RegexBuilder::new(&format!(r"(?i)\b{}\b", regex::escape(folded)))
        .size_limit(size_limit)
        .build()
        .map_err(|e| warn!(trigger = word, error = %e, "cannot compile trigger, it will never match"))
        .ok()
}

/// True if `word` occurs in `text` as a whole token.
///
/// `"Helloworld"` does not contain the word `"world"`; `"Café au lait"`
/// contains `"cafe"`. Regex metacharacters in `word` are matched literally.
pub fn contains_whole_word(text: &str, word: &str) -> bool {
    WordMatcher::new(word).matches(text, MatchMode::Contains)
}

/// True if the first whitespace-separated token of `text` is `word`.
pub fn starts_with_word(text: &str, word: &str) -> bool {
    WordMatcher::new(word).matches(text, MatchMode::StartsWith)
}

/// True if the last whitespace-separated token of `text` is `word`.
pub fn ends_with_word(text: &str, word: &str) -> bool {
    WordMatcher::new(word).matches(text, MatchMode::EndsWith)
}

/// Position of `word` in `text` under `mode`, used to order replies.
pub fn locate(text: &str, word: &str, mode: MatchMode) -> Option<usize> {
    WordMatcher::new(word).locate(text, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_whole_word() {
        assert!(contains_whole_word("hello world", "world"));
        assert!(contains_whole_word("hello, world!", "hello"));
        assert!(contains_whole_word("HELLO world", "hello"));
        assert!(!contains_whole_word("Helloworld", "world"));
        assert!(!contains_whole_word("worldly matters", "world"));
    }

    #[test]
    fn test_contains_whole_word_accents() {
        assert!(contains_whole_word("Café au lait", "cafe"));
        assert!(contains_whole_word("This message contains ça with accent", "ca"));
        assert!(contains_whole_word("un cafe noir", "café"));
    }

    #[test]
    fn test_contains_whole_word_phrase() {
        assert!(contains_whole_word("ok good night everyone", "good night"));
        assert!(!contains_whole_word("good nightmare", "good night"));
    }

    #[test]
    fn test_contains_whole_word_escapes_metacharacters() {
        assert!(contains_whole_word("look at a.b here", "a.b"));
        assert!(!contains_whole_word("look at axb here", "a.b"));
        assert!(!contains_whole_word("aaa", "a*"));
        // An unbalanced group must not be parsed as a pattern
        assert!(!contains_whole_word("anything", "(quoi"));
    }

    #[test]
    fn test_starts_with_word() {
        assert!(starts_with_word("  Hello world", "hello"));
        assert!(starts_with_word("start of a message", "start"));
        assert!(!starts_with_word("world hello", "hello"));
        assert!(!starts_with_word("hello, world", "hello"));
    }

    #[test]
    fn test_ends_with_word() {
        assert!(ends_with_word("Hello world  ", "WORLD"));
        assert!(ends_with_word("message end", "end"));
        assert!(ends_with_word("c'est quoi", "QUOÏ"));
        assert!(!ends_with_word("world hello", "world"));
    }

    #[test]
    fn test_empty_text_never_matches() {
        assert!(!contains_whole_word("", "hello"));
        assert!(!starts_with_word("", "hello"));
        assert!(!ends_with_word("", "hello"));
        assert!(!starts_with_word("   ", "hello"));
    }

    #[test]
    fn test_blank_word_never_matches() {
        assert!(!contains_whole_word("hello world", ""));
        assert!(!starts_with_word("hello world", " "));
        assert!(!ends_with_word("hello world", ""));
    }

    #[test]
    fn test_locate_contains_offset() {
        assert_eq!(locate("say match2 then match1", "match1", MatchMode::Contains), Some(16));
        assert_eq!(locate("say match2 then match1", "match2", MatchMode::Contains), Some(4));
        assert_eq!(locate("été quoi", "quoi", MatchMode::Contains), Some(4));
        assert_eq!(locate("nothing here", "quoi", MatchMode::Contains), None);
    }

    #[test]
    fn test_locate_starts_with_is_zero() {
        assert_eq!(locate("  quoi de neuf", "quoi", MatchMode::StartsWith), Some(0));
    }

    #[test]
    fn test_locate_ends_with_uses_original_length() {
        assert_eq!(locate("c'est quoi", "quoi", MatchMode::EndsWith), Some(6));
        // Trailing whitespace is counted in the original text length
        assert_eq!(locate("c'est quoi  ", "quoi", MatchMode::EndsWith), Some(8));
    }

    #[test]
    fn test_uncompilable_trigger_never_matches() {
        assert!(compile_pattern("quoi", "quoi", 1).is_none());

        let matcher = WordMatcher {
            word: "quoi".to_string(),
            folded: "quoi".to_string(),
            pattern: compile_pattern("quoi", "quoi", 1),
        };
        assert!(!matcher.matches("c'est quoi", MatchMode::Contains));
        assert!(compile_pattern("quoi", "quoi", PATTERN_SIZE_LIMIT).is_some());
    }

    #[test]
    fn test_word_matcher_keeps_configured_word() {
        let matcher = WordMatcher::new("Quoi");
        assert_eq!(matcher.word(), "Quoi");
        assert!(matcher.matches("mais quoi ?", MatchMode::Contains));
    }
}
