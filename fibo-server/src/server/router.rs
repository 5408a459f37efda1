use super::handlers::{self, AppState};
use super::metrics_handler::metrics_handler;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Router for the plain HTTP listener
pub fn create_http_router(state: AppState) -> Router {
    Router::new()
        // Range endpoint; other methods get a JSON 405
        .route(
            "/",
            get(handlers::get_fibonacci).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Router for the command envelope listener
pub fn create_rpc_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/command", post(handlers::command_handler))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
