use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::clock::unix_millis;
use crate::executor::protocol::HttpResult;
use crate::store::ErrorInfo;

/// Failures of facade operations.
///
/// Every variant maps to a stable machine-readable [`code`](Self::code) and
/// normalizes into the store's [`ErrorInfo`].
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Arguments rejected before anything was sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Worker '{worker}' not initialized")]
    NotInitialized { worker: String },

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The request never reached the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
        body: Value,
    },

    /// The executor failed or went away.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn code(&self) -> String {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR".to_string(),
            ApiError::NotInitialized { .. } => "NOT_INITIALIZED".to_string(),
            ApiError::Timeout { .. } => "TIMEOUT".to_string(),
            ApiError::Network(_) => "NETWORK_ERROR".to_string(),
            ApiError::Http { status, code, .. } => code
                .clone()
                .unwrap_or_else(|| format!("HTTP_{}", status)),
            ApiError::Worker(_) => "WORKER_ERROR".to_string(),
            ApiError::Decode(_) => "DECODE_ERROR".to_string(),
        }
    }

    /// `{message, code, timestamp}` as recorded in the store's error slice.
    pub fn normalize(&self) -> ErrorInfo {
        ErrorInfo {
            message: self.to_string(),
            code: self.code(),
            timestamp: unix_millis(),
        }
    }

    /// Build an `Http` error from a non-2xx result, preferring the body's own
    /// `message`/`error` and `code` fields when present.
    pub fn from_http(result: &HttpResult) -> Self {
        let field = |name: &str| result.data.get(name).and_then(Value::as_str);
        let message = field("message")
            .or_else(|| field("error"))
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!("HTTP {} {}", result.status, result.status_text)
                    .trim_end()
                    .to_string()
            });
        ApiError::Http {
            status: result.status,
            message,
            code: field("code").map(str::to_string),
            body: result.data.clone(),
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotInitialized { worker } => ApiError::NotInitialized { worker },
            BridgeError::Timeout { after, .. } => ApiError::Timeout { after },
            other => ApiError::Worker(other.to_string()),
        }
    }
}
