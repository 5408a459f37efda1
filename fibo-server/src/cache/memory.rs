use super::{CacheBackend, CacheResult};
use parking_lot::RwLock;
use radix_trie::{Trie, TrieCommon};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Stored term with its expiry
#[derive(Debug, Clone)]
struct StoredValue {
    data: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(data: String, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires| Instant::now() >= expires)
    }
}

/// Statistics for the in-process cache
#[derive(Debug, Default, Clone, Serialize)]
pub struct MemoryCacheStats {
    /// Number of live entries
    pub total_keys: usize,
    /// Number of GET operations
    pub gets: u64,
    /// Number of SET operations
    pub sets: u64,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl MemoryCacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-process term cache using a radix trie keyed by index text
#[derive(Clone, Default)]
pub struct MemoryCache {
    data: Arc<RwLock<Trie<String, StoredValue>>>,
    stats: Arc<RwLock<MemoryCacheStats>>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("stats", &*self.stats.read())
            .finish()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start background expiry sweep
    pub fn start_ttl_cleanup(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        info!("Starting cache TTL cleanup task (interval={:?})", interval);

        let cache = self.clone();
        tokio::spawn(async move {
            // A zero period would panic in `interval`
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            loop {
                ticker.tick().await;
                cache.cleanup_expired();
            }
        })
    }

    /// Get statistics
    pub fn stats(&self) -> MemoryCacheStats {
        self.stats.read().clone()
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut data = self.data.write();

        let expired_keys: Vec<String> = data
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone())
            .collect();

        let count = expired_keys.len();
        if count > 0 {
            debug!("Cleaning up {} expired cache entries", count);
            for key in expired_keys {
                data.remove(&key);
            }
            let mut stats = self.stats.write();
            stats.total_keys = stats.total_keys.saturating_sub(count);
        }
        count
    }
}

impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut data = self.data.write();
        let mut stats = self.stats.write();
        stats.gets += 1;

        let expired = match data.get(key) {
            Some(value) if !value.is_expired() => {
                stats.hits += 1;
                return Ok(Some(value.data.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(key = key, "Cache entry expired");
            data.remove(key);
            stats.total_keys = stats.total_keys.saturating_sub(1);
        }
        stats.misses += 1;
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let stored = StoredValue::new(value.to_string(), ttl);

        let mut data = self.data.write();
        let is_new = data.insert(key.to_string(), stored).is_none();

        let mut stats = self.stats.write();
        stats.sets += 1;
        if is_new {
            stats.total_keys += 1;
        }
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_get() {
        let cache = MemoryCache::new();

        cache.set("10", "55", HOUR).await.unwrap();

        let result = cache.get("10").await.unwrap();
        assert_eq!(result, Some("55".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_key_count() {
        let cache = MemoryCache::new();

        cache.set("7", "oops", HOUR).await.unwrap();
        cache.set("7", "13", HOUR).await.unwrap();

        assert_eq!(cache.get("7").await.unwrap(), Some("13".to_string()));
        assert_eq!(cache.stats().total_keys, 1);
        assert_eq!(cache.stats().sets, 2);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryCache::new();

        cache
            .set("1", "1", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(cache.get("1").await.unwrap(), Some("1".to_string()));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("1").await.unwrap(), None);
        assert_eq!(cache.stats().total_keys, 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = MemoryCache::new();

        cache.set("1", "1", Duration::ZERO).await.unwrap();
        cache.set("2", "1", HOUR).await.unwrap();

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.stats().total_keys, 1);
        assert_eq!(cache.get("2").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = MemoryCache::new();

        cache.set("1", "1", HOUR).await.unwrap();
        cache.get("1").await.unwrap();
        cache.get("2").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.gets, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_keys, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
