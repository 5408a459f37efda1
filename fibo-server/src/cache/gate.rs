//! Failure-counting wrapper deciding whether a request still trusts its cache.
//!
//! State machine: `Enabled --(consecutive_failures >= max_failures)--> Disabled`.
//! Disabled is terminal for the gate's lifetime; once there, no backend call is
//! attempted. Successful calls never lower the failure count, so a backend that
//! answers reads but rejects every write still trips the gate.

use super::{CacheBackend, CacheError, CacheResult};
use crate::core::Deadline;
use crate::metrics;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache health for one computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheState {
    pub enabled: bool,
    /// Transport errors seen in this computation; successes do not lower it
    pub consecutive_failures: u32,
    pub max_failures: u32,
}

impl CacheState {
    /// `max_failures == 0` starts disabled
    pub fn new(max_failures: u32) -> Self {
        Self {
            enabled: max_failures > 0,
            consecutive_failures: 0,
            max_failures,
        }
    }

    /// Count one failure; returns `true` when this failure disabled the cache
    fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.enabled && self.consecutive_failures >= self.max_failures {
            self.enabled = false;
            return true;
        }
        false
    }
}

/// Result of a gated cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Value found
    Hit(String),
    /// Backend answered, key absent
    Miss,
    /// Backend error or timeout; counted against the gate
    Failed,
    /// Gate disabled; backend not consulted
    Disabled,
}

/// Per-computation view of a shared cache backend
pub struct CacheGate<'a, B: CacheBackend> {
    backend: &'a B,
    ttl: Duration,
    state: CacheState,
}

impl<'a, B: CacheBackend> CacheGate<'a, B> {
    pub fn new(backend: &'a B, ttl: Duration, max_failures: u32) -> Self {
        let mut state = CacheState::new(max_failures);
        state.enabled &= backend.is_enabled();
        Self {
            backend,
            ttl,
            state,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Read `key`, bounded by the time left before `deadline`
    pub async fn get(&mut self, key: &str, deadline: &Deadline) -> Lookup {
        if !self.state.enabled {
            return Lookup::Disabled;
        }

        match bounded(self.backend.get(key), deadline).await {
            Ok(Some(value)) => {
                record_success("get");
                Lookup::Hit(value)
            }
            Ok(None) => {
                record_success("get");
                Lookup::Miss
            }
            Err(e) => {
                self.on_failure("get", &e);
                Lookup::Failed
            }
        }
    }

    /// Store `value` under `key`. Failures are counted, never returned.
    pub async fn set(&mut self, key: &str, value: &str, deadline: &Deadline) {
        if !self.state.enabled {
            return;
        }

        match bounded(self.backend.set(key, value, self.ttl), deadline).await {
            Ok(()) => record_success("set"),
            Err(e) => self.on_failure("set", &e),
        }
    }

    fn on_failure(&mut self, operation: &str, error: &CacheError) {
        metrics::CACHE_OPS_TOTAL
            .with_label_values(&[operation, "error"])
            .inc();
        warn!(
            backend = self.backend.name(),
            operation = operation,
            failure = self.state.consecutive_failures + 1,
            max_failures = self.state.max_failures,
            "Cache {} error: {}",
            operation,
            error
        );

        if self.state.record_failure() {
            metrics::CACHE_DISABLED_TOTAL.inc();
            warn!(
                backend = self.backend.name(),
                failures = self.state.consecutive_failures,
                "Cache disabled for the rest of this request"
            );
        }
    }
}

fn record_success(operation: &str) {
    metrics::CACHE_OPS_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
}

/// Run a backend call with the request's remaining time as its timeout
async fn bounded<T>(
    call: impl Future<Output = CacheResult<T>>,
    deadline: &Deadline,
) -> CacheResult<T> {
    match deadline.remaining() {
        None => call.await,
        Some(remaining) => match tokio::time::timeout(remaining, call).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Cache call exceeded request deadline");
                Err(CacheError::Timeout(format!(
                    "no reply within {:?}",
                    remaining
                )))
            }
        },
    }
}
