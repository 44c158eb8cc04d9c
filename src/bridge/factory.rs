//! Resolution of worker paths to running execution contexts.

use std::sync::Arc;

use crate::executor::fetch::HttpFetcher;
use crate::executor::protocol::WorkerEndpoint;
use crate::executor::{Executor, API_WORKER_PATH};

use super::error::BridgeError;

/// Starts an execution context for `path` and returns its endpoint.
///
/// Called on a tokio runtime; implementations may spawn tasks.
pub trait WorkerFactory: Send + Sync {
    fn spawn(&self, name: &str, path: &str) -> Result<WorkerEndpoint, BridgeError>;
}

/// Factory for the HTTP executor. Knows only [`API_WORKER_PATH`].
pub struct ExecutorFactory {
    fetcher: Arc<dyn HttpFetcher>,
}

impl ExecutorFactory {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

impl WorkerFactory for ExecutorFactory {
    fn spawn(&self, name: &str, path: &str) -> Result<WorkerEndpoint, BridgeError> {
        if path != API_WORKER_PATH {
            return Err(BridgeError::SpawnFailed {
                worker: name.to_string(),
                path: path.to_string(),
                reason: "unknown worker script".to_string(),
            });
        }
        Ok(Executor::new(Arc::clone(&self.fetcher)).spawn(name))
    }
}
