//! Cooperative stop latch shared between a retry loop and its callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle that requests a running retry loop to stop.
///
/// The handle is passed into every attempt and can also be obtained from
/// [`Redo::stop_handle`](crate::Redo::stop_handle). Clones share the same latch; once set it stays
/// set. Stopping never interrupts an in-flight attempt or sleep, it only prevents the next attempt.
///
/// Handles only come from a controller, so every handle is bound to a running loop:
///
/// ```compile_fail
/// let detached = redo::StopHandle::default();
/// ```
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub(crate) fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)) }
    }

    /// Request the loop to stop. Idempotent.
    pub fn stop(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            tracing::debug!("retry stop requested");
        }
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
