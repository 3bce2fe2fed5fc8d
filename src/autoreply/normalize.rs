//! Text normalization
//!
//! Accent folding applied to both sides of every trigger comparison.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritical marks from `text`.
///
/// The text is decomposed (NFD), every combining mark is dropped, and the
/// rest is recomposed (NFC), so `"Ça"` becomes `"Ca"` and `"café"` becomes
/// `"cafe"`. Characters that decompose without marks, such as Hangul
/// syllables, come back whole and keep char offsets aligned with the input.
pub fn remove_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Accent-fold and lower-case `text` for token comparison.
pub fn fold(text: &str) -> String {
    remove_accents(text).to_lowercase()
}
