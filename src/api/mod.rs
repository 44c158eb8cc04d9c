//! Incident API facade.
//!
//! Translates domain calls into executor requests sent over the bridge,
//! tracks outstanding requests for the store's loading flag, and normalizes
//! failures into `{message, code, timestamp}`.

mod error;
mod service;

pub use error::ApiError;
pub use service::{ApiService, ApiSettings, IncidentQuery, API_WORKER_NAME};
