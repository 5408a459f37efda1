use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::cache::DEFAULT_ENTRY_TTL;
use crate::core::CacheSettings;

/// Request timeout used when a transport's timeout is missing or zero
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: TransportConfig,
    pub rpc: TransportConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http: TransportConfig::default(),
            rpc: TransportConfig {
                port: 8081,
                ..TransportConfig::default()
            },
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Listener settings for one transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Per-request computation budget
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        }
    }
}

impl TransportConfig {
    /// Listener address
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request timeout, falling back to the default for a zero value
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            warn!(
                "Invalid request timeout 0ms, using default value - {:?}",
                DEFAULT_REQUEST_TIMEOUT
            );
            return DEFAULT_REQUEST_TIMEOUT;
        }
        Duration::from_millis(self.timeout_ms)
    }
}

/// Which cache the service talks to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub host: String,
    pub port: u16,
    /// Entry time-to-live
    pub expiration_secs: u64,
    /// Consecutive failures before a request stops using the cache; 0 disables it
    pub max_failures: u32,
    /// Expiry sweep interval for the memory backend
    pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            host: "localhost".to_string(),
            port: 6379,
            expiration_secs: DEFAULT_ENTRY_TTL.as_secs(),
            max_failures: 6,
            cleanup_interval_ms: 1000,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime, falling back to the default for a zero value
    pub fn expiration(&self) -> Duration {
        if self.expiration_secs == 0 {
            warn!(
                "Invalid cache expiration 0s, using default value - {:?}",
                DEFAULT_ENTRY_TTL
            );
            return DEFAULT_ENTRY_TTL;
        }
        Duration::from_secs(self.expiration_secs)
    }

    /// Whether requests consult a cache at all
    pub fn is_enabled(&self) -> bool {
        self.backend != CacheBackendKind::Disabled && self.max_failures > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Convert to the computation's cache policy
    pub fn to_cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: self.cache.expiration(),
            max_failures: if self.cache.is_enabled() {
                self.cache.max_failures
            } else {
                0
            },
        }
    }
}
