//! Auto-reply Module
//!
//! Answers messages that contain configured trigger words. Supports three
//! match modes, secondary trigger words, literal / uniform / weighted answers,
//! and a randomized reply delay.

pub mod config;
pub mod delay;
pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod selector;

pub use config::{
    AnswerSpec, ConfigError, MatchMode, TriggerConfig, TriggerEntry, TriggerTable, WeightedAnswer,
};
pub use delay::{box_muller_factor, estimate_delay, DelayMode, DEFAULT_MAX_DELAY_MINUTES};
pub use engine::{
    create_engine, join_responses, AutoReplyEngine, MatchResult, SenderFilter, RATIO_SUFFIX,
    RESPONSE_SEPARATOR,
};
pub use matcher::{contains_whole_word, ends_with_word, locate, starts_with_word, WordMatcher};
pub use normalize::remove_accents;
pub use selector::{resolve, RandomSource, ScriptedRandom, ThreadRandom};
