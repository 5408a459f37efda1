pub mod cache;
pub mod config;
pub mod core;
pub mod logging;
pub mod metrics;
pub mod protocol;
pub mod server;

// Re-export commonly used types
pub use cache::{CacheBackend, CacheError, CacheProvider, MemoryCache, RedisCache};
pub use config::ServerConfig;
pub use core::{
    CacheSettings, ComputationResult, Deadline, FiboError, Range, RangeComputer, SequenceEngine,
};
pub use logging::init_logging;
pub use metrics::init_metrics;
pub use protocol::{RangeResponse, Request, Response};
pub use server::{AppState, Shutdown, create_http_router, create_rpc_router, serve};
