//! Response selection
//!
//! Turns an [`AnswerSpec`] into the text to send. Uniform and weighted
//! answers draw from a [`RandomSource`] so tests can pin the outcome.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rand::Rng;

use super::config::{AnswerSpec, ConfigError};

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Draws from the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Replays a fixed sequence of draws.
///
/// Once the sequence is exhausted the last value keeps being returned, so a
/// single value pins every draw.
#[derive(Debug)]
pub struct ScriptedRandom {
    draws: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            last: Mutex::new(0.0),
        }
    }

    /// Always return `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        let mut last = self.last.lock();
        if let Some(next) = self.draws.lock().pop_front() {
            *last = next;
        }
        *last
    }
}

/// Pick the response for a fired trigger.
///
/// `Ok(None)` means the weighted draw landed past the total probability: the
/// trigger fired but deliberately says nothing.
pub fn resolve(answer: &AnswerSpec, random: &dyn RandomSource) -> Result<Option<String>, ConfigError> {
    match answer {
        AnswerSpec::Literal(text) => Ok(Some(text.clone())),
        AnswerSpec::Uniform(options) => {
            if options.is_empty() {
                return Err(ConfigError::EmptyAnswerList);
            }
            let index = ((random.next_f64() * options.len() as f64) as usize).min(options.len() - 1);
            Ok(Some(options[index].clone()))
        }
        AnswerSpec::Weighted(entries) => {
            if entries.is_empty() {
                return Err(ConfigError::EmptyAnswerList);
            }
            let draw = random.next_f64();
            let mut cumulative = 0.0;
            for entry in entries {
                cumulative += entry.probability;
                if draw < cumulative {
                    return Ok(Some(entry.response.clone()));
                }
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted() -> AnswerSpec {
        AnswerSpec::weighted([("a", 0.4), ("b", 0.3)])
    }

    #[test]
    fn test_literal_returned_unchanged() {
        let answer = AnswerSpec::literal("feur");
        let result = resolve(&answer, &ScriptedRandom::constant(0.99)).unwrap();
        assert_eq!(result.as_deref(), Some("feur"));
    }

    #[test]
    fn test_uniform_pick_uses_floor() {
        let answer = AnswerSpec::uniform(["a", "b", "c", "d"]);
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.5)).unwrap().as_deref(), Some("c"));
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.0)).unwrap().as_deref(), Some("a"));
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.99)).unwrap().as_deref(), Some("d"));
    }

    #[test]
    fn test_uniform_empty_list_is_error() {
        let answer = AnswerSpec::Uniform(Vec::new());
        let err = resolve(&answer, &ScriptedRandom::constant(0.5)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAnswerList));
        assert_eq!(err.to_string(), "empty answer list");
    }

    #[test]
    fn test_weighted_pick_by_cumulative_probability() {
        let answer = weighted();
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.1)).unwrap().as_deref(), Some("a"));
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.5)).unwrap().as_deref(), Some("b"));
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.95)).unwrap(), None);
    }

    #[test]
    fn test_weighted_boundary_goes_to_next_entry() {
        // cumulative must exceed the draw
        let answer = weighted();
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.4)).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_weighted_zero_probability_never_picked() {
        let answer = AnswerSpec::weighted([("never", 0.0), ("always", 1.0)]);
        assert_eq!(resolve(&answer, &ScriptedRandom::constant(0.0)).unwrap().as_deref(), Some("always"));
    }

    #[test]
    fn test_weighted_empty_list_is_error() {
        let answer = AnswerSpec::Weighted(Vec::new());
        assert!(resolve(&answer, &ScriptedRandom::constant(0.5)).is_err());
    }

    #[test]
    fn test_scripted_random_sequence_then_repeats_last() {
        let random = ScriptedRandom::new([0.1, 0.7]);
        assert_eq!(random.next_f64(), 0.1);
        assert_eq!(random.next_f64(), 0.7);
        assert_eq!(random.next_f64(), 0.7);
    }

    #[test]
    fn test_thread_random_in_range() {
        let random = ThreadRandom;
        for _ in 0..1000 {
            let draw = random.next_f64();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}
