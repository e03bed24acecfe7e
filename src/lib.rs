#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Redo
//!
//! A cooperative retry controller for async Rust: run a fallible operation until it succeeds,
//! a budget runs out, or someone asks it to stop.
//!
//! ## Features
//!
//! - **Fixed-delay retries** bounded by an attempt count (`-1` retries forever)
//! - **Exponential backoff** with randomization, bounded by elapsed time
//! - **Cooperative stop** from inside the operation or from another task
//! - **Last error inspection** while the loop runs and after it returns
//! - **Injectable time** via `Sleeper` and `Clock` for deterministic tests
//!
//! ## Quick Start
//!
//! ```rust
//! use redo::{BackoffConfig, Redo};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let redo: Redo<Arc<std::io::Error>> = Redo::new(3, Duration::from_millis(10));
//!
//!     let result = redo.run(|stop| async move {
//!         // Your async operation here; call `stop.stop()` to give up early
//!         let _ = stop;
//!         Ok::<_, Arc<std::io::Error>>(())
//!     }).await;
//!     assert!(result.is_ok());
//!
//!     let config = BackoffConfig::default().with_max_elapsed_time(Some(Duration::from_secs(5)));
//!     let result = redo.back_off(&config, |_stop| async { Ok::<_, Arc<std::io::Error>>(()) }).await;
//!     assert!(result.is_ok());
//! }
//! ```
//!
//! `run`, `back_off` and [`Redo::last_err`] require `E: Clone`; wrap non-cloneable errors such as
//! `std::io::Error` in `Arc`.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod jitter;
pub mod prelude;
pub mod retry;
pub mod sleeper;
pub mod stop;
pub mod telemetry;

// Re-exports
pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{FixedDelayConfig, MaxAttempts};
pub use error::{BackoffConfigError, RedoError};
pub use jitter::Jitter;
pub use retry::Redo;
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use stop::StopHandle;
pub use telemetry::{EventSink, LogSink, MemorySink, NullSink, RetryEvent};
