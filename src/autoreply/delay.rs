//! Reply delay
//!
//! Replies are held back by a random delay so the bot does not answer
//! instantly. The delay is half-normal: mostly short, with a long tail capped
//! at the configured maximum.

use std::f64::consts::PI;
use std::time::Duration;

use super::selector::RandomSource;

/// Standard deviation applied to the normal sample, as a fraction of the maximum
pub const DELAY_STD_DEV: f64 = 0.3;

/// Default upper bound for a reply delay
pub const DEFAULT_MAX_DELAY_MINUTES: u64 = 60;

/// Environment variable that switches the delay off (`FEUR_ENV=test`)
pub const ENV_VAR: &str = "FEUR_ENV";

/// When set, replies go out immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    /// Wait a random delay before replying
    #[default]
    Random,
    /// No delay at all
    Immediate,
}

impl DelayMode {
    /// `Immediate` if `explicit` is set or `FEUR_ENV=test`.
    pub fn detect(explicit: bool) -> Self {
        Self::detect_from(explicit, std::env::var(ENV_VAR).ok().as_deref())
    }

    /// `detect` with the `FEUR_ENV` value supplied by the caller.
    pub fn detect_from(explicit: bool, env_value: Option<&str>) -> Self {
        let from_env = env_value.is_some_and(|v| v.trim().eq_ignore_ascii_case("test"));

        if explicit || from_env {
            Self::Immediate
        } else {
            Self::Random
        }
    }
}

/// Scale factor in `[0, 1]` from two uniform draws in `(0, 1)`.
///
/// Box-Muller gives a standard normal sample `z0`; `|z0| * 0.3` is capped
/// at 1.
pub fn box_muller_factor(u1: f64, u2: f64) -> f64 {
    let u1 = u1.max(f64::MIN_POSITIVE);
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    (z0 * DELAY_STD_DEV).abs().min(1.0)
}

/// Random delay of at most `max_minutes`.
pub fn estimate_delay(max_minutes: u64, mode: DelayMode, random: &dyn RandomSource) -> Duration {
    if mode == DelayMode::Immediate {
        return Duration::ZERO;
    }

    let factor = box_muller_factor(random.next_f64(), random.next_f64());
    let max_ms = max_minutes.saturating_mul(60_000) as f64;
    Duration::from_millis((factor * max_ms).floor() as u64)
}
