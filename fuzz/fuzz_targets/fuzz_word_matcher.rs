#![no_main]

use libfuzzer_sys::fuzz_target;

use feur::autoreply::normalize::fold;
use feur::autoreply::{locate, MatchMode, WordMatcher};

fuzz_target!(|data: &str| {
    // First line is the trigger, the rest is the message. Triggers are
    // escaped before being compiled, so no input may panic or hang the
    // regex engine, and offsets must stay inside the (folded) message.
    let (word, text) = data.split_once('\n').unwrap_or((data, ""));
    let matcher = WordMatcher::new(word);

    for mode in [MatchMode::Contains, MatchMode::StartsWith, MatchMode::EndsWith] {
        if let Some(position) = matcher.locate(text, mode) {
            let len = match mode {
                MatchMode::Contains => fold(text).chars().count(),
                _ => text.chars().count(),
            };
            assert!(position <= len);
            assert_eq!(locate(text, word, mode), Some(position));
        }
    }
});
