//! Convenient re-exports for common Redo types.
pub use crate::{
    backoff::{
        BackoffConfig, ExponentialBackoff, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_ELAPSED_TIME,
        DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_RANDOMIZATION_FACTOR,
    },
    config::{FixedDelayConfig, MaxAttempts},
    error::{BackoffConfigError, RedoError},
    retry::Redo,
    stop::StopHandle,
};
