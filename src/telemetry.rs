//! Structured events emitted by retry loops and the sinks that consume them.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Events emitted by [`Redo`](crate::Redo) loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    /// An attempt failed and the loop is about to wait before the next one.
    Attempt {
        /// The attempt that just failed (1-indexed)
        attempt: usize,
        /// The wait before the next attempt
        delay: Duration,
    },
    /// An attempt succeeded.
    Succeeded {
        /// Total number of attempts made
        attempts: usize,
        /// Time spent in the loop
        elapsed: Duration,
    },
    /// The loop ended because a stop was requested.
    Stopped {
        /// Attempts completed before the stop took effect
        attempts: usize,
    },
    /// The attempt or elapsed-time budget ran out.
    Exhausted {
        /// Total number of attempts made
        attempts: usize,
        /// Time spent in the loop
        elapsed: Duration,
    },
}

impl fmt::Display for RetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryEvent::Attempt { attempt, delay } => {
                write!(f, "Attempt(#{}, delay={:?})", attempt, delay)
            }
            RetryEvent::Succeeded { attempts, elapsed } => {
                write!(f, "Succeeded(attempts={}, elapsed={:?})", attempts, elapsed)
            }
            RetryEvent::Stopped { attempts } => write!(f, "Stopped(attempts={})", attempts),
            RetryEvent::Exhausted { attempts, elapsed } => {
                write!(f, "Exhausted(attempts={}, elapsed={:?})", attempts, elapsed)
            }
        }
    }
}

/// A sink that consumes retry events. Emission is synchronous and must not block.
pub trait EventSink: Send + Sync + fmt::Debug {
    fn emit(&self, event: &RetryEvent);
}

/// A no-op sink that discards all events.
#[derive(Clone, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &RetryEvent) {}
}

/// A sink that logs events using the `tracing` crate.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &RetryEvent) {
        tracing::info!(event = %event, "retry_event");
    }
}

/// A sink that stores events in memory, evicting the oldest once full.
#[derive(Clone, Debug)]
pub struct MemorySink {
    events: Arc<Mutex<VecDeque<RetryEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn events(&self) -> Vec<RetryEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &RetryEvent) {
        let mut guard = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.len() >= self.capacity {
            guard.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        guard.push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let attempt = RetryEvent::Attempt { attempt: 2, delay: Duration::from_millis(100) };
        assert_eq!(attempt.to_string(), "Attempt(#2, delay=100ms)");
        assert_eq!(RetryEvent::Stopped { attempts: 1 }.to_string(), "Stopped(attempts=1)");
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.emit(&RetryEvent::Stopped { attempts: 1 });
        sink.emit(&RetryEvent::Stopped { attempts: 2 });
        assert_eq!(
            sink.events(),
            vec![RetryEvent::Stopped { attempts: 1 }, RetryEvent::Stopped { attempts: 2 }]
        );
        sink.clear();
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn memory_sink_evicts_oldest() {
        let sink = MemorySink::with_capacity(2);
        for attempts in 1..=3 {
            sink.emit(&RetryEvent::Stopped { attempts });
        }
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.evicted(), 1);
        assert_eq!(sink.events()[0], RetryEvent::Stopped { attempts: 2 });
    }

    #[test]
    fn memory_sink_clones_share_storage() {
        let sink = MemorySink::with_capacity(4);
        let other = sink.clone();
        other.emit(&RetryEvent::Stopped { attempts: 1 });
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn null_and_log_sinks_accept_events() {
        let event = RetryEvent::Exhausted { attempts: 3, elapsed: Duration::from_secs(1) };
        NullSink.emit(&event);
        LogSink.emit(&event);
    }
}
