use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by [`Bridge`](super::Bridge) operations and replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No execution context is registered under this name.
    #[error("Worker '{worker}' not initialized")]
    NotInitialized { worker: String },

    /// The factory could not start the context.
    #[error("Failed to start worker '{worker}' from '{path}': {reason}")]
    SpawnFailed {
        worker: String,
        path: String,
        reason: String,
    },

    /// The context started but never announced readiness.
    #[error("Worker '{worker}' not ready after {}ms", .after.as_millis())]
    ReadyTimeout { worker: String, after: Duration },

    /// No response arrived for a request within the response timeout.
    #[error("Request {id} timed out after {}ms", .after.as_millis())]
    Timeout { id: String, after: Duration },

    /// The context was terminated while the request was pending.
    #[error("Worker '{worker}' terminated with request {id} pending")]
    Terminated { worker: String, id: String },

    /// The context's channels closed unexpectedly.
    #[error("Worker '{worker}' disconnected")]
    Disconnected { worker: String },
}
