use serde::{Deserialize, Serialize};

/// Command name for a range computation
pub const RANGE_COMMAND: &str = "fibonacci.range";

/// Command envelope request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Command to execute (e.g., "fibonacci.range")
    pub command: String,
    /// Unique request identifier
    pub request_id: String,
    /// Command payload
    pub payload: serde_json::Value,
}

/// Command envelope response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the operation finished without error
    pub success: bool,
    /// Matching request identifier
    pub request_id: String,
    /// Response payload (present on success and on partial results)
    pub payload: Option<serde_json::Value>,
    /// Error message (if failed or cut short)
    pub error: Option<String>,
}

/// Payload of `fibonacci.range`: range bounds in either order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePayload {
    pub x: i64,
    pub y: i64,
}

/// Body shared by both transports: decimal terms plus optional error text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeResponse {
    pub data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Request {
    /// Create a new request
    pub fn new(command: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            command: command.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
            payload,
        }
    }

    /// Create a range request
    pub fn range(x: i64, y: i64) -> Self {
        Self::new(RANGE_COMMAND, serde_json::json!({ "x": x, "y": y }))
    }
}

impl Response {
    /// Create a successful response
    pub fn success(request_id: String, payload: serde_json::Value) -> Self {
        Self {
            success: true,
            request_id,
            payload: Some(payload),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(request_id: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Create a response carrying partial data and the reason it is partial
    pub fn partial(request_id: String, payload: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id,
            payload: Some(payload),
            error: Some(error.into()),
        }
    }
}
