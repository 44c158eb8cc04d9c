use thiserror::Error;

/// A dispatched action could not be turned into a typed [`Action`](super::Action).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action is missing a type")]
    MissingType,

    #[error("Unknown action type '{action_type}'")]
    UnknownType { action_type: String },

    #[error("Invalid payload for '{action_type}': {reason}")]
    InvalidPayload { action_type: String, reason: String },
}

/// Error reported by a single middleware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MiddlewareError(pub String);

impl MiddlewareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One middleware that failed (returned an error or panicked) during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareFailure {
    pub middleware: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The state update went through, but some middlewares failed.
    #[error("{} middleware(s) failed for action #{sequence_id}: {}", failures.len(), describe(failures))]
    Middleware {
        sequence_id: u64,
        failures: Vec<MiddlewareFailure>,
    },
}

fn describe(failures: &[MiddlewareFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.middleware, failure.message))
        .collect::<Vec<_>>()
        .join(", ")
}
