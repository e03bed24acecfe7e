//! Retry controller
//!
//! [`Redo`] drives one fallible async operation until it succeeds, a budget runs out, or a stop is
//! requested.
//!
//! Semantics:
//! - [`Redo::run`] waits a fixed `retry_delay` between attempts and is bounded by an attempt count.
//!   Running out of attempts yields [`RedoError::MaxRetryReached`].
//! - [`Redo::back_off`] waits exponentially growing, randomized intervals and is bounded by the
//!   elapsed time of the loop. Running out of time yields the last operation error.
//! - Every attempt receives a [`StopHandle`]. Stopping, either through that handle or through
//!   [`Redo::stop`] from another task, never interrupts an attempt or a sleep: the current attempt
//!   completes and no further attempt starts.
//! - [`Redo::last_err`] holds the outcome of the most recent attempt and can be read from any task.
//!
//! Invariants:
//! - The stop latch never resets; a stopped controller runs no further attempts.
//! - Attempts never exceed `max_attempts` when it is limited.
//! - The sentinel is never returned once a stop has been requested.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use redo::{Redo, RedoError};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let redo: Redo<String> = Redo::new(3, Duration::from_millis(10));
//! let result = redo.run(|_stop| async { Err::<(), _>("unavailable".to_string()) }).await;
//! assert!(matches!(result, Err(RedoError::MaxRetryReached { attempts: 3 })));
//! assert_eq!(redo.last_err().as_deref(), Some("unavailable"));
//! # });
//! ```

use crate::backoff::{BackoffConfig, ExponentialBackoff};
use crate::clock::{Clock, MonotonicClock};
use crate::config::{FixedDelayConfig, MaxAttempts};
use crate::error::RedoError;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::stop::StopHandle;
use crate::telemetry::{EventSink, NullSink, RetryEvent};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct RunState<E> {
    stop: StopHandle,
    last_err: Mutex<Option<E>>,
    attempts: AtomicUsize,
}

/// Retry controller for a single logical operation.
///
/// Clones share the stop latch and the last error, so a clone moved into another task can stop
/// the loop or observe its progress.
pub struct Redo<E> {
    max_attempts: MaxAttempts,
    retry_delay: Duration,
    state: Arc<RunState<E>>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl<E> Clone for Redo<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            retry_delay: self.retry_delay,
            state: self.state.clone(),
            sleeper: self.sleeper.clone(),
            clock: self.clock.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<E> std::fmt::Debug for Redo<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redo")
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("stopped", &self.state.stop.is_stopped())
            .field("attempts", &self.attempts())
            .field("sleeper", &self.sleeper)
            .field("clock", &self.clock)
            .field("sink", &self.sink)
            .finish()
    }
}

impl<E> Redo<E> {
    /// Create a controller. A negative `max_attempts` (conventionally `-1`) retries forever.
    pub fn new(max_attempts: i64, retry_delay: Duration) -> Self {
        Self::with_attempts(MaxAttempts::from(max_attempts), retry_delay)
    }

    /// Create a controller with an explicit attempt budget.
    pub fn with_attempts(max_attempts: MaxAttempts, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
            state: Arc::new(RunState {
                stop: StopHandle::new(),
                last_err: Mutex::new(None),
                attempts: AtomicUsize::new(0),
            }),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(MonotonicClock::default()),
            sink: Arc::new(NullSink),
        }
    }

    pub fn from_config(config: &FixedDelayConfig) -> Self {
        Self::with_attempts(config.max_attempts, config.retry_delay)
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Override the clock used for elapsed-time budgets.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Send retry events to `sink`.
    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: EventSink + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    pub fn max_attempts(&self) -> MaxAttempts {
        self.max_attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Request the running loop to stop before its next attempt. Idempotent.
    pub fn stop(&self) {
        self.state.stop.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stop.is_stopped()
    }

    /// Handle bound to this controller's stop latch.
    pub fn stop_handle(&self) -> StopHandle {
        self.state.stop.clone()
    }

    /// Attempts started by the most recent loop.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::Acquire)
    }

    fn record(&self, outcome: Option<E>) {
        *self.state.last_err.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    fn elapsed_since(&self, started_at: u64) -> Duration {
        Duration::from_millis(self.clock.now_millis().saturating_sub(started_at))
    }
}

impl<E: Clone> Redo<E> {
    /// Error returned by the most recent attempt; `None` before any attempt or after a success.
    pub fn last_err(&self) -> Option<E> {
        self.state.last_err.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run `operation` until it succeeds, waiting `retry_delay` after every failure.
    ///
    /// Returns [`RedoError::MaxRetryReached`] once the attempt budget is spent. If a stop was
    /// requested, returns the error of the last attempt instead (or `Ok(())` if none failed).
    pub async fn run<Op, Fut>(&self, mut operation: Op) -> Result<(), RedoError<E>>
    where
        Op: FnMut(StopHandle) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let started_at = self.clock.now_millis();
        self.state.attempts.store(0, Ordering::Release);
        let mut attempt = 0usize;

        while !self.is_stopped() {
            attempt += 1;

            if self.max_attempts.is_exhausted(attempt) {
                let attempts = attempt - 1;
                tracing::warn!(attempts, "retry attempts exhausted");
                self.sink.emit(&RetryEvent::Exhausted {
                    attempts,
                    elapsed: self.elapsed_since(started_at),
                });
                return Err(RedoError::MaxRetryReached { attempts });
            }

            self.state.attempts.store(attempt, Ordering::Release);
            match operation(self.stop_handle()).await {
                Ok(()) => {
                    self.record(None);
                    self.sink.emit(&RetryEvent::Succeeded {
                        attempts: attempt,
                        elapsed: self.elapsed_since(started_at),
                    });
                    return Ok(());
                }
                Err(err) => {
                    self.record(Some(err.clone()));
                    if self.is_stopped() {
                        tracing::info!(attempt, "retry stopped by operation");
                        self.sink.emit(&RetryEvent::Stopped { attempts: attempt });
                        return Err(RedoError::Operation(err));
                    }
                    tracing::debug!(attempt, delay = ?self.retry_delay, "attempt failed, retrying");
                    self.sink.emit(&RetryEvent::Attempt { attempt, delay: self.retry_delay });
                    self.sleeper.sleep(self.retry_delay).await;
                }
            }
        }

        let attempts = self.attempts();
        tracing::info!(attempts, "retry stopped");
        self.sink.emit(&RetryEvent::Stopped { attempts });
        match self.last_err() {
            Some(err) => Err(RedoError::Operation(err)),
            None => Ok(()),
        }
    }

    /// Run `operation` until it succeeds, waiting exponentially growing intervals from `config`.
    ///
    /// The operation runs at least once even if the elapsed-time budget is already spent. Once
    /// the budget is exceeded, the last operation error is returned. A stop requested by the
    /// operation returns that attempt's error; a stop observed between attempts returns `Ok(())`
    /// while [`last_err`](Self::last_err) keeps the last failure.
    pub async fn back_off<Op, Fut>(
        &self,
        config: &BackoffConfig,
        mut operation: Op,
    ) -> Result<(), RedoError<E>>
    where
        Op: FnMut(StopHandle) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut backoff = ExponentialBackoff::new(config.clone(), self.clock.clone());
        self.state.attempts.store(0, Ordering::Release);
        let mut attempt = 0usize;

        loop {
            if self.is_stopped() {
                tracing::info!(attempts = attempt, "backoff stopped");
                self.sink.emit(&RetryEvent::Stopped { attempts: attempt });
                return Ok(());
            }

            attempt += 1;
            self.state.attempts.store(attempt, Ordering::Release);
            let err = match operation(self.stop_handle()).await {
                Ok(()) => {
                    self.record(None);
                    self.sink.emit(&RetryEvent::Succeeded {
                        attempts: attempt,
                        elapsed: backoff.elapsed(),
                    });
                    return Ok(());
                }
                Err(err) => err,
            };

            self.record(Some(err.clone()));
            if self.is_stopped() {
                tracing::info!(attempt, "backoff stopped by operation");
                self.sink.emit(&RetryEvent::Stopped { attempts: attempt });
                return Err(RedoError::Operation(err));
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    tracing::debug!(attempt, ?delay, "attempt failed, backing off");
                    self.sink.emit(&RetryEvent::Attempt { attempt, delay });
                    self.sleeper.sleep(delay).await;
                }
                None => {
                    let elapsed = backoff.elapsed();
                    tracing::warn!(attempts = attempt, ?elapsed, "backoff elapsed time exhausted");
                    self.sink.emit(&RetryEvent::Exhausted { attempts: attempt, elapsed });
                    return Err(RedoError::Operation(err));
                }
            }
        }
    }
}
