//! Exponential backoff configuration and interval generation.
//!
//! Each call to [`ExponentialBackoff::next_backoff`] yields the current interval randomized by
//! `randomization_factor`, then grows the interval by `multiplier` up to `max_interval`. Once the
//! time elapsed since construction (or the last [`reset`](ExponentialBackoff::reset)) exceeds
//! `max_elapsed_time`, the generator returns `None` to signal that the budget is spent.
//!
//! Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use redo::{BackoffConfig, ExponentialBackoff, ManualClock};
//!
//! let config = BackoffConfig::default()
//!     .with_initial_interval(Duration::from_millis(100))
//!     .with_multiplier(2.0)
//!     .with_randomization_factor(0.0)
//!     .with_max_interval(Duration::from_millis(300));
//! let clock = ManualClock::new();
//! let mut backoff = ExponentialBackoff::new(config, Arc::new(clock));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300))); // capped
//! ```

use crate::clock::Clock;
use crate::error::BackoffConfigError;
use crate::jitter::Jitter;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ELAPSED_TIME: Duration = Duration::from_secs(15 * 60);

/// Parameters of an exponential backoff loop.
///
/// `max_elapsed_time` of `None` (or zero) means the loop is never cut off by elapsed time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct BackoffConfig {
    initial_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
    max_interval: Duration,
    max_elapsed_time: Option<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed_time: Some(DEFAULT_MAX_ELAPSED_TIME),
        }
    }
}

impl BackoffConfig {
    /// Create a validated config.
    pub fn new(
        initial_interval: Duration,
        multiplier: f64,
        randomization_factor: f64,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
    ) -> Result<Self, BackoffConfigError> {
        let cfg = Self {
            initial_interval,
            multiplier,
            randomization_factor,
            max_interval,
            max_elapsed_time,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants enforced by [`BackoffConfig::new`].
    pub fn validate(&self) -> Result<(), BackoffConfigError> {
        if self.initial_interval.is_zero() {
            return Err(BackoffConfigError::ZeroInitialInterval);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(BackoffConfigError::InvalidMultiplier(self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.randomization_factor) {
            return Err(BackoffConfigError::InvalidRandomizationFactor(self.randomization_factor));
        }
        if self.max_interval < self.initial_interval {
            return Err(BackoffConfigError::MaxLessThanInitial {
                initial: self.initial_interval,
                max: self.max_interval,
            });
        }
        Ok(())
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the elapsed-time budget. `None` or zero disables it.
    pub fn with_max_elapsed_time(mut self, budget: Option<Duration>) -> Self {
        self.max_elapsed_time = budget;
        self
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn randomization_factor(&self) -> f64 {
        self.randomization_factor
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Effective elapsed-time budget; zero is normalized to `None`.
    pub fn max_elapsed_time(&self) -> Option<Duration> {
        self.max_elapsed_time.filter(|d| !d.is_zero())
    }
}

/// Stateful interval generator for one backoff loop.
///
/// Unvalidated configs are tolerated: a multiplier below `1.0` is treated as `1.0`, the
/// randomization factor is clamped into `[0, 1]`, and a `max_interval` below `initial_interval`
/// caps at `initial_interval`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial: Duration,
    max_interval: Duration,
    multiplier: f64,
    max_elapsed: Option<Duration>,
    jitter: Jitter,
    current: Duration,
    started_at: u64,
    clock: Arc<dyn Clock>,
}

impl ExponentialBackoff {
    /// Build a generator and start its elapsed-time window now.
    pub fn new(config: BackoffConfig, clock: Arc<dyn Clock>) -> Self {
        let multiplier =
            if config.multiplier.is_finite() && config.multiplier >= 1.0 { config.multiplier } else { 1.0 };
        let max_interval = config.max_interval.max(config.initial_interval);
        let started_at = clock.now_millis();
        Self {
            initial: config.initial_interval,
            max_interval,
            multiplier,
            max_elapsed: config.max_elapsed_time(),
            jitter: Jitter::proportional(config.randomization_factor),
            current: config.initial_interval,
            started_at,
            clock,
        }
    }

    /// Restart from the initial interval and reopen the elapsed-time window.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.started_at = self.clock.now_millis();
    }

    /// Time since construction or the last reset.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.clock.now_millis().saturating_sub(self.started_at))
    }

    /// Whether the elapsed-time budget has been exceeded.
    pub fn is_exhausted(&self) -> bool {
        self.max_elapsed.is_some_and(|budget| self.elapsed() > budget)
    }

    /// Current un-randomized interval.
    pub fn current_interval(&self) -> Duration {
        self.current
    }

    /// Next wait duration, or `None` once the elapsed-time budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.jitter.apply(self.current);
        self.grow();
        Some(delay)
    }

    /// Same as [`next_backoff`](Self::next_backoff) with a caller-supplied RNG.
    pub fn next_backoff_with_rng<R: Rng>(&mut self, rng: &mut R) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.jitter.apply_with_rng(self.current, rng);
        self.grow();
        Some(delay)
    }

    fn grow(&mut self) {
        let grown = self.current.as_secs_f64() * self.multiplier;
        self.current = if grown >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::try_from_secs_f64(grown).unwrap_or(self.max_interval)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deterministic(config: BackoffConfig) -> (ExponentialBackoff, ManualClock) {
        let clock = ManualClock::new();
        let backoff =
            ExponentialBackoff::new(config.with_randomization_factor(0.0), Arc::new(clock.clone()));
        (backoff, clock)
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = BackoffConfig::default();
        assert_eq!(cfg.initial_interval(), Duration::from_millis(500));
        assert_eq!(cfg.multiplier(), 1.5);
        assert_eq!(cfg.randomization_factor(), 0.5);
        assert_eq!(cfg.max_interval(), Duration::from_secs(60));
        assert_eq!(cfg.max_elapsed_time(), Some(Duration::from_secs(900)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn intervals_grow_by_multiplier() {
        let (mut backoff, _clock) = deterministic(BackoffConfig::default());
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(500)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(750)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(1125)));
    }

    #[test]
    fn intervals_cap_at_max_interval() {
        let cfg = BackoffConfig::default()
            .with_initial_interval(Duration::from_secs(1))
            .with_multiplier(10.0)
            .with_max_interval(Duration::from_secs(5));
        let (mut backoff, _clock) = deterministic(cfg);
        assert_eq!(backoff.current_interval(), Duration::from_secs(1));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.current_interval(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn stops_once_elapsed_exceeds_budget() {
        let cfg = BackoffConfig::default().with_max_elapsed_time(Some(Duration::from_secs(1)));
        let (mut backoff, clock) = deterministic(cfg);
        assert!(backoff.next_backoff().is_some());
        clock.advance(1000);
        assert!(backoff.next_backoff().is_some(), "budget is only spent once exceeded");
        clock.advance(1);
        assert_eq!(backoff.next_backoff(), None);
        assert!(backoff.is_exhausted());
    }

    #[test]
    fn zero_or_absent_budget_is_unbounded() {
        for budget in [None, Some(Duration::ZERO)] {
            let cfg = BackoffConfig::default().with_max_elapsed_time(budget);
            let (mut backoff, clock) = deterministic(cfg);
            clock.advance(u64::from(u32::MAX));
            assert!(backoff.next_backoff().is_some());
        }
    }

    #[test]
    fn reset_restores_initial_interval_and_window() {
        let cfg = BackoffConfig::default().with_max_elapsed_time(Some(Duration::from_millis(10)));
        let (mut backoff, clock) = deterministic(cfg);
        backoff.next_backoff();
        backoff.next_backoff();
        clock.advance(50);
        assert_eq!(backoff.next_backoff(), None);

        backoff.reset();
        assert_eq!(backoff.elapsed(), Duration::ZERO);
        assert_eq!(backoff.current_interval(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn randomized_interval_stays_in_band() {
        let clock = ManualClock::new();
        let mut backoff = ExponentialBackoff::new(BackoffConfig::default(), Arc::new(clock));
        let mut rng = StdRng::seed_from_u64(42);
        let first = backoff.next_backoff_with_rng(&mut rng).expect("within budget");
        assert!(first >= Duration::from_millis(250) && first <= Duration::from_millis(750));
        let second = backoff.next_backoff_with_rng(&mut rng).expect("within budget");
        assert!(second >= Duration::from_millis(375) && second <= Duration::from_millis(1125));
    }

    #[test]
    fn unvalidated_multiplier_is_floored() {
        let (mut backoff, _clock) = deterministic(BackoffConfig::default().with_multiplier(0.1));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(500)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn new_rejects_invalid_values() {
        let ok = Duration::from_secs(1);
        assert_eq!(
            BackoffConfig::new(Duration::ZERO, 1.5, 0.5, ok, None).unwrap_err(),
            BackoffConfigError::ZeroInitialInterval
        );
        assert!(matches!(
            BackoffConfig::new(ok, 0.5, 0.5, ok, None),
            Err(BackoffConfigError::InvalidMultiplier(_))
        ));
        assert!(matches!(
            BackoffConfig::new(ok, 1.5, 1.5, ok, None),
            Err(BackoffConfigError::InvalidRandomizationFactor(_))
        ));
        assert!(matches!(
            BackoffConfig::new(ok, 1.5, 0.5, Duration::from_millis(10), None),
            Err(BackoffConfigError::MaxLessThanInitial { .. })
        ));
        assert!(BackoffConfig::new(ok, 1.0, 0.0, ok, Some(ok)).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_fills_defaults() {
        let json = serde_json::json!({ "multiplier": 2.0, "max_elapsed_time": null });
        let cfg: BackoffConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(cfg.multiplier(), 2.0);
        assert_eq!(cfg.max_elapsed_time(), None);
        assert_eq!(cfg.initial_interval(), DEFAULT_INITIAL_INTERVAL);
    }
}
