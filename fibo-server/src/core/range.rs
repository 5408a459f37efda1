use super::deadline::Deadline;
use super::error::{FiboError, Result};
use super::sequence::SequenceEngine;
use super::types::{ComputationResult, Range};
use crate::cache::{CacheBackend, CacheGate, DEFAULT_ENTRY_TTL, Lookup, entry_key};
use crate::metrics;
use num_bigint::BigInt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on up-front allocation for the result vector
const PREALLOC_LIMIT: u128 = 4096;

/// Cache policy applied to every computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Lifetime of written entries
    pub ttl: Duration,
    /// Consecutive cache failures before a computation stops using the cache
    pub max_failures: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_ENTRY_TTL,
            max_failures: 6,
        }
    }
}

/// Computes a range of terms with cache lookups and a deadline.
///
/// Shared by all requests. Each call to [`RangeComputer::compute`] gets its
/// own [`CacheGate`], so one request's cache outage never disables caching
/// for another.
pub struct RangeComputer<B: CacheBackend> {
    cache: Arc<B>,
    engine: SequenceEngine,
    settings: CacheSettings,
}

impl<B: CacheBackend> RangeComputer<B> {
    pub fn new(cache: Arc<B>, settings: CacheSettings) -> Self {
        Self {
            cache,
            engine: SequenceEngine::new(),
            settings,
        }
    }

    pub fn cache(&self) -> &B {
        &self.cache
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Terms for every index between `a` and `b` inclusive, in ascending
    /// index order. Stops early with partial values once `deadline` passes.
    pub async fn compute(&self, a: i64, b: i64, deadline: Deadline) -> Result<ComputationResult> {
        let range = Range::new(a, b);
        let requested = range.len();
        let deadline = Arc::new(deadline);
        let mut gate = CacheGate::new(
            self.cache.as_ref(),
            self.settings.ttl,
            self.settings.max_failures,
        );

        debug!(
            lo = range.lo(),
            hi = range.hi(),
            cache = gate.is_enabled(),
            "Computing range"
        );

        let mut values = Vec::with_capacity(requested.min(PREALLOC_LIMIT) as usize);
        for index in range.lo()..=range.hi() {
            if let Some(value) = self.term(index, &mut gate, &deadline).await? {
                values.push(value);
            }

            if deadline.is_expired() && (values.len() as u128) < requested {
                info!(
                    "timeout exit: returned {} values from {}",
                    values.len(),
                    requested
                );
                return Ok(ComputationResult::timed_out(values, requested, gate.state()));
            }
        }

        Ok(ComputationResult::complete(values, gate.state()))
    }

    /// One term, from the cache when possible. `None` means the deadline
    /// stopped the computation of this index.
    async fn term(
        &self,
        index: i64,
        gate: &mut CacheGate<'_, B>,
        deadline: &Arc<Deadline>,
    ) -> Result<Option<String>> {
        let key = entry_key(index);

        match gate.get(&key, deadline).await {
            Lookup::Hit(text) => match text.parse::<BigInt>() {
                Ok(value) => {
                    metrics::VALUES_TOTAL.with_label_values(&["cache"]).inc();
                    Ok(Some(value.to_string()))
                }
                Err(_) => {
                    warn!(key = %key, value = %text, "Wrong value in cache, recomputing");
                    metrics::CACHE_CORRUPT_TOTAL.inc();
                    self.compute_and_store(index, &key, gate, deadline).await
                }
            },
            Lookup::Miss => self.compute_and_store(index, &key, gate, deadline).await,
            Lookup::Failed | Lookup::Disabled => self.compute_term(index, deadline).await,
        }
    }

    async fn compute_and_store(
        &self,
        index: i64,
        key: &str,
        gate: &mut CacheGate<'_, B>,
        deadline: &Arc<Deadline>,
    ) -> Result<Option<String>> {
        let value = self.compute_term(index, deadline).await?;
        if let Some(text) = &value {
            if !deadline.is_expired() {
                gate.set(key, text, deadline).await;
            }
        }
        Ok(value)
    }

    /// Run the sequence engine on a blocking worker
    async fn compute_term(&self, index: i64, deadline: &Arc<Deadline>) -> Result<Option<String>> {
        let engine = self.engine;
        let deadline = Arc::clone(deadline);

        let value = tokio::task::spawn_blocking(move || {
            engine.nth(index, &deadline).map(|v| v.to_string())
        })
        .await
        .map_err(|e| FiboError::InternalError(format!("sequence worker failed: {}", e)))?;

        if value.is_some() {
            metrics::VALUES_TOTAL.with_label_values(&["computed"]).inc();
        }
        Ok(value)
    }
}
