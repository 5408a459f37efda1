use anyhow::{Context, Result};
use clap::Parser;
use fibo_server::cache::CacheBackend;
use fibo_server::config::CacheBackendKind;
use fibo_server::server::shutdown_signal;
use fibo_server::{
    AppState, CacheProvider, RangeComputer, ServerConfig, Shutdown, create_http_router,
    create_rpc_router, init_logging, init_metrics, serve,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "fibo-server")]
#[command(about = "Fibonacci range service over HTTP and command envelope", version)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "./config/fibonacci.yml")]
    config: PathBuf,

    /// Never consult the cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let mut config = if config_found {
        ServerConfig::from_file(&args.config)
            .with_context(|| format!("failed to load config {}", args.config.display()))?
    } else {
        ServerConfig::default()
    };
    if args.no_cache {
        config.cache.backend = CacheBackendKind::Disabled;
    }

    init_logging(&config.logging);
    if !config_found {
        warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }
    init_metrics();

    info!("Starting Fibonacci Server v{}", env!("CARGO_PKG_VERSION"));

    let provider = CacheProvider::from_config(&config.cache)?;
    if let CacheProvider::Memory(store) = &provider {
        store.start_ttl_cleanup(Duration::from_millis(config.cache.cleanup_interval_ms));
    }

    if provider.is_enabled() {
        info!(
            backend = provider.name(),
            max_failures = config.cache.max_failures,
            "Cache enabled"
        );
        if let Err(e) = provider.ping().await {
            // Requests still run; each one degrades on its own
            warn!(error = %e, "Cache not reachable at startup");
        }
    } else {
        info!("Cache disabled, every term is computed");
    }

    let computer = Arc::new(RangeComputer::new(
        Arc::new(provider),
        config.to_cache_settings(),
    ));
    let http_state = AppState::new(Arc::clone(&computer), config.http.timeout());
    let rpc_state = AppState::new(computer, config.rpc.timeout());

    let http_listener = TcpListener::bind(config.http.addr())
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http.addr()))?;
    let rpc_listener = TcpListener::bind(config.rpc.addr())
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", config.rpc.addr()))?;

    info!("HTTP listening on http://{}", http_listener.local_addr()?);
    info!(
        "Command API listening on http://{}/api/v1/command",
        rpc_listener.local_addr()?
    );

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.fire();
    });

    let (http, rpc) = tokio::join!(
        serve(http_listener, create_http_router(http_state), shutdown.clone()),
        serve(rpc_listener, create_rpc_router(rpc_state), shutdown),
    );
    http.context("HTTP server failed")?;
    rpc.context("RPC server failed")?;

    info!("Server stopped");
    Ok(())
}
