use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Wall-clock cutoff for one computation, with a one-shot cancellation flag.
///
/// The flag is set at most once; every later check is a cheap load. The same
/// `Deadline` is polled by the range loop and, through an `Arc`, by the
/// sequence engine running on a blocking worker.
#[derive(Debug)]
pub struct Deadline {
    at: Option<Instant>,
    cancelled: AtomicBool,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Deadline at an absolute instant
    pub fn at(instant: Instant) -> Self {
        Self {
            at: Some(instant),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Deadline that only expires through an explicit `cancel`
    pub fn never() -> Self {
        Self {
            at: None,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Mark the deadline as cancelled.
    ///
    /// Returns `true` only for the call that flipped the flag.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        if first {
            debug!("Computation cancelled: deadline reached");
        }
        first
    }

    /// Whether the deadline has passed. Sets the cancellation flag when it has.
    pub fn is_expired(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match self.at {
            Some(at) if Instant::now() >= at => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    /// Time left before the deadline; `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        if self.cancelled.load(Ordering::Acquire) {
            return Some(Duration::ZERO);
        }
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}
