use crate::cache::{CacheBackend, CacheProvider};
use crate::core::{ComputationResult, Deadline, FiboError, Range, RangeComputer, Result};
use crate::metrics;
use crate::protocol::{RANGE_COMMAND, RangePayload, RangeResponse, Request, Response};
use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Metric/log label of the plain HTTP transport
pub const HTTP_TRANSPORT: &str = "http";
/// Metric/log label of the command envelope transport
pub const RPC_TRANSPORT: &str = "rpc";

/// Per-listener state. The computer is shared; the timeout is not.
#[derive(Clone)]
pub struct AppState {
    pub computer: Arc<RangeComputer<CacheProvider>>,
    /// Budget for one range computation on this listener
    pub timeout: Duration,
}

impl AppState {
    pub fn new(computer: Arc<RangeComputer<CacheProvider>>, timeout: Duration) -> Self {
        Self { computer, timeout }
    }

    /// Run one range under this listener's deadline and record the outcome
    async fn run_range(&self, transport: &'static str, range: Range) -> Result<ComputationResult> {
        let started = Instant::now();
        let result = self
            .computer
            .compute(range.lo(), range.hi(), Deadline::after(self.timeout))
            .await;

        let outcome = match &result {
            Ok(r) if r.is_complete() => "ok",
            Ok(_) => "timeout",
            Err(_) => "error",
        };
        metrics::record_request(transport, outcome, started.elapsed().as_secs_f64());
        result
    }
}

/// Parse a `"A,B"` range body. Surrounding whitespace on each bound is ignored.
pub fn parse_range(body: &str) -> Result<Range> {
    let mut parts = body.split(',');
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FiboError::MalformedRange);
    };
    Ok(Range::new(parse_bound(a)?, parse_bound(b)?))
}

fn parse_bound(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|source| FiboError::InvalidInteger {
            value: trimmed.to_string(),
            source,
        })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cache = state.computer.cache();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fibonacci",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "backend": cache.name(),
            "enabled": cache.is_enabled() && state.computer.settings().max_failures > 0,
        }
    }))
}

/// GET / - body `"A,B"`, responds with every term between the two bounds.
/// A body that is not UTF-8 is malformed like any other bad body.
pub async fn get_fibonacci(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Result<Json<RangeResponse>> {
    let parsed = std::str::from_utf8(&body)
        .map_err(|_| FiboError::MalformedRange)
        .and_then(parse_range);
    let range = match parsed {
        Ok(range) => range,
        Err(e) => {
            let body = String::from_utf8_lossy(&body);
            warn!(peer = %peer, body = %body, error = %e, "Rejected range request");
            metrics::record_request(HTTP_TRANSPORT, "rejected", 0.0);
            return Err(e);
        }
    };

    debug!(peer = %peer, lo = range.lo(), hi = range.hi(), "HTTP range request");

    let (data, error) = state.run_range(HTTP_TRANSPORT, range).await?.into_parts();
    info!(peer = %peer, "Sent {} values to client", data.len());

    Ok(Json(RangeResponse { data, error }))
}

/// Fallback for any method other than GET on `/`
pub async fn method_not_allowed(method: Method, uri: Uri) -> impl IntoResponse {
    let message = format!("method {} not supported on uri {}", method, uri.path());
    debug!("{}", message);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(RangeResponse {
            data: Vec::new(),
            error: Some(message),
        }),
    )
}

/// POST /api/v1/command - command envelope endpoint.
/// A body that is not an envelope gets an error envelope with an empty request id.
pub async fn command_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> (StatusCode, Json<Response>) {
    let request: Request = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            metrics::record_request(RPC_TRANSPORT, "rejected", 0.0);
            let error = FiboError::InvalidRequest(format!("malformed command envelope: {}", e));
            warn!(peer = %peer, error = %error, "Rejected command");
            return (
                error.status_code(),
                Json(Response::error(String::new(), error.to_string())),
            );
        }
    };

    debug!(
        "Command: {} (request_id={})",
        request.command, request.request_id
    );

    let request_id = request.request_id.clone();
    match handle_command(&state, peer, request).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Command failed");
            (e.status_code(), Json(Response::error(request_id, e.to_string())))
        }
    }
}

/// Handle individual commands
async fn handle_command(state: &AppState, peer: SocketAddr, request: Request) -> Result<Response> {
    match request.command.as_str() {
        RANGE_COMMAND => handle_range_cmd(state, peer, request).await,
        other => {
            metrics::record_request(RPC_TRANSPORT, "rejected", 0.0);
            Err(FiboError::UnknownCommand(other.to_string()))
        }
    }
}

async fn handle_range_cmd(state: &AppState, peer: SocketAddr, request: Request) -> Result<Response> {
    let RangePayload { x, y } = serde_json::from_value(request.payload).map_err(|e| {
        metrics::record_request(RPC_TRANSPORT, "rejected", 0.0);
        FiboError::InvalidRequest(format!("payload must be {{x, y}} integers: {}", e))
    })?;

    let (data, error) = state
        .run_range(RPC_TRANSPORT, Range::new(x, y))
        .await?
        .into_parts();
    info!(peer = %peer, request_id = %request.request_id, "Sent {} values to client", data.len());

    let payload = serde_json::json!({ "data": data });
    Ok(match error {
        Some(error) => Response::partial(request.request_id, payload, error),
        None => Response::success(request.request_id, payload),
    })
}
