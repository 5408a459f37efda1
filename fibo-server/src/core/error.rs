use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Text returned to callers whose range body is not two comma-separated values
pub const MALFORMED_RANGE_MESSAGE: &str = "request's body should has two int values through a comma";

/// Main error type for Fibonacci service operations
#[derive(Debug, Error)]
pub enum FiboError {
    #[error("{}", MALFORMED_RANGE_MESSAGE)]
    MalformedRange,

    #[error("invalid integer {value:?}: {source}")]
    InvalidInteger {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("timeout exit: returned {returned} values from {requested}")]
    Timeout { returned: usize, requested: u128 },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl FiboError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRange
            | Self::InvalidInteger { .. }
            | Self::UnknownCommand(_)
            | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            // Partial results are a normal outcome for the caller
            Self::Timeout { .. } => StatusCode::OK,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implement IntoResponse for Axum integration
impl IntoResponse for FiboError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "data": [],
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for Fibonacci service operations
pub type Result<T> = std::result::Result<T, FiboError>;
