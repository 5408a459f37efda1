//! Cache backends for computed Fibonacci terms.
//!
//! Entries map the decimal text of an index to the decimal text of its term.
//! Backends are reached through [`CacheProvider`] (enum dispatch) and every
//! call made on behalf of a request goes through a per-request [`CacheGate`].

pub mod gate;
pub mod memory;
pub mod redis;

use crate::config::{CacheBackendKind, CacheConfig};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use gate::{CacheGate, CacheState, Lookup};
pub use memory::{MemoryCache, MemoryCacheStats};
pub use self::redis::RedisCache;

/// Default lifetime of a cached term (12 hours)
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Errors raised by a cache backend.
///
/// A clean miss is never an error; it is `Ok(None)` from [`CacheBackend::get`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to connect to cache backend
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Cache operation did not finish before the request deadline
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Generic backend error
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache key for a sequence index
pub fn entry_key(index: i64) -> String {
    index.to_string()
}

/// Operations the range computation needs from a key-value cache.
///
/// Implementations must be safe to share between concurrent requests.
pub trait CacheBackend: Send + Sync {
    /// Returns `Ok(Some(value))` on hit, `Ok(None)` on a clean miss.
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Store `value` under `key` for `ttl`
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Check that the backend answers
    fn ping(&self) -> impl Future<Output = CacheResult<()>> + Send;

    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Whether requests should consult this backend at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Configured cache backend
#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// Redis (boxed to keep the enum small)
    Redis(Box<RedisCache>),
    /// In-process TTL store
    Memory(MemoryCache),
    /// Cache turned off; every request computes directly
    Disabled,
}

impl CacheProvider {
    /// Build the backend named in the configuration.
    ///
    /// A cache with `max_failures == 0` is never consulted, so it is not built.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        if !config.is_enabled() {
            return Ok(Self::Disabled);
        }
        match config.backend {
            CacheBackendKind::Redis => Ok(Self::Redis(Box::new(RedisCache::new(
                &config.host,
                config.port,
            )?))),
            CacheBackendKind::Memory => Ok(Self::Memory(MemoryCache::new())),
            CacheBackendKind::Disabled => Ok(Self::Disabled),
        }
    }
}

impl CacheBackend for CacheProvider {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Redis(c) => c.get(key).await,
            Self::Memory(c) => c.get(key).await,
            Self::Disabled => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            Self::Redis(c) => c.set(key, value, ttl).await,
            Self::Memory(c) => c.set(key, value, ttl).await,
            Self::Disabled => Ok(()),
        }
    }

    async fn ping(&self) -> CacheResult<()> {
        match self {
            Self::Redis(c) => c.ping().await,
            Self::Memory(c) => c.ping().await,
            Self::Disabled => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Redis(c) => c.name(),
            Self::Memory(c) => c.name(),
            Self::Disabled => "disabled",
        }
    }

    fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}
