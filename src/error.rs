//! Error types for the retry controller

use std::time::Duration;
use thiserror::Error;

/// Outcome error of a retry loop.
///
/// `MaxRetryReached` is only produced by [`Redo::run`](crate::Redo::run) when the attempt
/// budget, not a stop request, ended the loop. Every other failure is the operation's own error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedoError<E> {
    /// The fixed-delay loop used up its attempt budget.
    #[error("max retry reached")]
    MaxRetryReached {
        /// Attempt budget that was exhausted.
        attempts: usize,
    },
    /// The operation failed and the loop ended without a success.
    #[error(transparent)]
    Operation(#[from] E),
}

impl<E> RedoError<E> {
    /// Check if this is the attempt-budget sentinel.
    pub fn is_max_retry_reached(&self) -> bool {
        matches!(self, Self::MaxRetryReached { .. })
    }

    /// Check if this wraps an operation error.
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Borrow the operation error if present.
    pub fn as_operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::MaxRetryReached { .. } => None,
        }
    }

    /// Take the operation error if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::MaxRetryReached { .. } => None,
        }
    }

    /// Attempt budget carried by the sentinel.
    pub fn max_attempts(&self) -> Option<usize> {
        match self {
            Self::MaxRetryReached { attempts } => Some(*attempts),
            Self::Operation(_) => None,
        }
    }
}

/// Errors returned when validating a [`BackoffConfig`](crate::BackoffConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackoffConfigError {
    #[error("initial_interval must be greater than zero")]
    ZeroInitialInterval,
    #[error("multiplier must be >= 1.0 (got {0})")]
    InvalidMultiplier(f64),
    #[error("randomization_factor must be within [0, 1] (got {0})")]
    InvalidRandomizationFactor(f64),
    #[error("max_interval ({max:?}) must be >= initial_interval ({initial:?})")]
    MaxLessThanInitial { initial: Duration, max: Duration },
}
