//! Configuration for the fixed-delay retry loop.

use std::time::Duration;

/// Attempt budget of a fixed-delay loop.
///
/// Converts from the integer form used in configuration files: any negative value means
/// [`MaxAttempts::Unbounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "i64", into = "i64")
)]
pub enum MaxAttempts {
    /// At most this many attempts.
    Limited(usize),
    /// Retry until success or a stop request.
    Unbounded,
}

impl MaxAttempts {
    /// Whether attempt number `attempt` (1-based) is past the budget.
    pub fn is_exhausted(&self, attempt: usize) -> bool {
        match self {
            MaxAttempts::Limited(max) => attempt > *max,
            MaxAttempts::Unbounded => false,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            MaxAttempts::Limited(max) => Some(*max),
            MaxAttempts::Unbounded => None,
        }
    }
}

impl From<i64> for MaxAttempts {
    fn from(value: i64) -> Self {
        match usize::try_from(value) {
            Ok(max) => MaxAttempts::Limited(max),
            Err(_) if value < 0 => MaxAttempts::Unbounded,
            Err(_) => MaxAttempts::Limited(usize::MAX),
        }
    }
}

impl From<MaxAttempts> for i64 {
    fn from(value: MaxAttempts) -> Self {
        match value {
            MaxAttempts::Limited(max) => i64::try_from(max).unwrap_or(i64::MAX),
            MaxAttempts::Unbounded => -1,
        }
    }
}

impl From<Option<usize>> for MaxAttempts {
    fn from(value: Option<usize>) -> Self {
        value.map_or(MaxAttempts::Unbounded, MaxAttempts::Limited)
    }
}

/// Settings of the fixed-delay loop, see [`Redo::from_config`](crate::Redo::from_config).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedDelayConfig {
    pub max_attempts: MaxAttempts,
    pub retry_delay: Duration,
}

impl FixedDelayConfig {
    pub fn new(max_attempts: impl Into<MaxAttempts>, retry_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.into(), retry_delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_sentinel_is_unbounded() {
        assert_eq!(MaxAttempts::from(-1i64), MaxAttempts::Unbounded);
        assert_eq!(MaxAttempts::from(-42i64), MaxAttempts::Unbounded);
        assert_eq!(MaxAttempts::from(0i64), MaxAttempts::Limited(0));
        assert_eq!(MaxAttempts::from(3i64), MaxAttempts::Limited(3));
        assert_eq!(i64::from(MaxAttempts::Unbounded), -1);
        assert_eq!(i64::from(MaxAttempts::Limited(7)), 7);
    }

    #[test]
    fn exhaustion_is_strictly_past_the_limit() {
        let budget = MaxAttempts::Limited(3);
        assert!(!budget.is_exhausted(3));
        assert!(budget.is_exhausted(4));
        assert!(MaxAttempts::Limited(0).is_exhausted(1));
        assert!(!MaxAttempts::Unbounded.is_exhausted(usize::MAX));
    }

    #[test]
    fn limit_reports_budget() {
        assert_eq!(MaxAttempts::Limited(5).limit(), Some(5));
        assert_eq!(MaxAttempts::Unbounded.limit(), None);
        assert_eq!(MaxAttempts::from(-1i64).limit(), None);
    }

    #[test]
    fn option_conversion() {
        assert_eq!(MaxAttempts::from(None::<usize>), MaxAttempts::Unbounded);
        assert_eq!(MaxAttempts::from(Some(2usize)), MaxAttempts::Limited(2));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_integer_sentinel() {
        let cfg = FixedDelayConfig::new(MaxAttempts::Unbounded, Duration::from_millis(100));
        let json = serde_json::to_value(&cfg).expect("serialize");
        assert_eq!(json["max_attempts"], -1);
        let back: FixedDelayConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, cfg);
    }
}
