//! Randomization of backoff intervals
//!
//! A randomization factor `f` spreads an interval `d` uniformly over `[d - f*d, d + f*d]`, which
//! keeps many clients retrying the same dependency from waking up in lockstep.
//!
//! Notes:
//! - RNG: uses `rand`'s thread-local RNG by default; deterministic RNGs can be injected via
//!   `apply_with_rng`.
//! - A factor of `0.0` returns the interval unchanged and never touches the RNG.

use rand::{rng, Rng};
use std::time::Duration;

/// Proportional jitter applied to each backoff interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    factor: f64,
}

impl Jitter {
    /// Jitter with the given factor, clamped into `[0, 1]`.
    pub fn proportional(factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
        Self { factor }
    }

    /// No randomization.
    pub fn none() -> Self {
        Self { factor: 0.0 }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Randomize `interval` using the thread-local RNG.
    pub fn apply(&self, interval: Duration) -> Duration {
        if self.factor == 0.0 {
            return interval;
        }
        self.apply_with_rng(interval, &mut rng())
    }

    /// Randomize `interval` with a caller-supplied RNG (for testing).
    pub fn apply_with_rng<R: Rng>(&self, interval: Duration, rng: &mut R) -> Duration {
        if self.factor == 0.0 || interval.is_zero() {
            return interval;
        }
        let secs = interval.as_secs_f64();
        let delta = self.factor * secs;
        let low = secs - delta;
        let high = secs + delta;
        let picked = rng.random_range(low..=high);
        Duration::try_from_secs_f64(picked).unwrap_or(Duration::MAX)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::none()
    }
}
