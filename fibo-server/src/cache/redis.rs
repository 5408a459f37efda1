use super::{CacheBackend, CacheError, CacheResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Redis-backed term cache.
///
/// The multiplexed `ConnectionManager` is created on first use and shared by
/// every request; it reconnects on its own after transport failures. A failed
/// first connection is reported like any other backend error so the request's
/// gate can count it.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    addr: String,
    connection: std::sync::Arc<OnceCell<ConnectionManager>>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("addr", &self.addr)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisCache {
    /// Create a client for `host:port`; no connection is made yet
    pub fn new(host: &str, port: u16) -> CacheResult<Self> {
        let addr = format!("{}:{}", host, port);
        let client = redis::Client::open(format!("redis://{}/", addr)).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        info!("Redis cache configured at {}", addr);

        Ok(Self {
            client,
            addr,
            connection: std::sync::Arc::new(OnceCell::new()),
        })
    }

    /// Server address this cache talks to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connection(&self) -> CacheResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                // Requests carry their own deadlines; fail fast instead of
                // retrying the first connection for seconds.
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(CONNECT_TIMEOUT);
                let manager = ConnectionManager::new_with_config(self.client.clone(), config)
                    .await
                    .map_err(|e| {
                        CacheError::Connection(format!("Failed to connect to Redis: {}", e))
                    })?;
                debug!(addr = %self.addr, "Redis connection established");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis GET failed: {}", e)))?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let ttl_seconds = ttl.as_secs().max(1);

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis SETEX failed: {}", e)))?;

        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis PING failed: {}", e)))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend(format!(
                "Unexpected PING reply: {}",
                pong
            )))
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
