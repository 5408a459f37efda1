pub mod handlers;
pub mod metrics_handler;
pub mod router;
pub mod shutdown;

pub use handlers::{AppState, HTTP_TRANSPORT, RPC_TRANSPORT, parse_range};
pub use metrics_handler::metrics_handler;
pub use router::{create_http_router, create_rpc_router};
pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_signal};

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Serve `router` on `listener` until `shutdown` fires.
///
/// Handlers read the peer address, so the router is served with connect info.
pub async fn serve(listener: TcpListener, router: Router, shutdown: Shutdown) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.wait())
    .await
}
