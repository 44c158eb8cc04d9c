//! Background HTTP executor.
//!
//! # Architecture
//!
//! ```text
//! Bridge ──RequestEnvelope──→ run() ──spawn──→ handle(command) ──→ ResponseEnvelope
//!                               │                  │
//!                               │                  ├─ request: cache? ──→ HttpFetcher
//!                               │                  ├─ purgeCache
//!                               │                  └─ getCacheStats
//!                               └─ WorkerMessage::Init (once, at start)
//! ```
//!
//! Each envelope is handled on its own task, so replies go out in completion
//! order. The cache is private to one executor instance.
//!
//! - `protocol.rs` - Envelopes, options and result shapes
//! - `cache.rs` - `ResponseCache` with TTL, purge modes and stats
//! - `fetch.rs` - `HttpFetcher` trait and the reqwest implementation

pub mod cache;
pub mod fetch;
pub mod protocol;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use cache::{cache_key, ResponseCache};
use fetch::HttpFetcher;
use protocol::{
    CacheStats, FetchOutcome, HttpMethod, HttpResult, NetworkFailure, PurgeOptions, PurgeReport,
    RequestEnvelope, RequestOptions, ResponseEnvelope, WorkerCommand, WorkerEndpoint,
    WorkerFailure, WorkerMessage, WorkerResult,
};

/// Script path under which the HTTP executor is registered.
pub const API_WORKER_PATH: &str = "workers/api-worker";

#[derive(Clone)]
pub struct Executor {
    fetcher: Arc<dyn HttpFetcher>,
    cache: Arc<Mutex<ResponseCache>>,
}

impl Executor {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            fetcher,
            cache: Arc::new(Mutex::new(ResponseCache::new())),
        }
    }

    /// Start the executor on the current runtime and hand back its endpoint.
    pub fn spawn(self, name: &str) -> WorkerEndpoint {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let name = name.to_string();
        let task = tokio::spawn(self.run(name, outbound_rx, inbound_tx));
        WorkerEndpoint {
            outbound: outbound_tx,
            inbound: inbound_rx,
            task: Some(task),
        }
    }

    /// Announce readiness, then serve envelopes until the sender side closes.
    pub async fn run(
        self,
        name: String,
        mut requests: mpsc::UnboundedReceiver<RequestEnvelope>,
        replies: mpsc::UnboundedSender<WorkerMessage>,
    ) {
        if replies
            .send(WorkerMessage::ready(format!("{} ready", name)))
            .is_err()
        {
            tracing::debug!(worker = %name, "Executor caller gone before init");
            return;
        }
        tracing::debug!(worker = %name, "Executor started");

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                envelope = requests.recv() => {
                    let Some(envelope) = envelope else { break };
                    let executor = self.clone();
                    let replies = replies.clone();
                    tasks.spawn(async move {
                        let RequestEnvelope { id, command } = envelope;
                        let result = executor.handle(command).await;
                        if replies
                            .send(WorkerMessage::Response(ResponseEnvelope { id, result }))
                            .is_err()
                        {
                            tracing::trace!("Executor reply dropped (caller gone)");
                        }
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!(worker = %name, error = %e, "Executor task failed");
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(worker = %name, error = %e, "Executor task failed");
            }
        }
        tracing::debug!(worker = %name, "Executor stopped");
    }

    pub async fn handle(&self, command: WorkerCommand) -> WorkerResult {
        match command {
            WorkerCommand::Request(options) => WorkerResult::Fetch(self.request(&options).await),
            WorkerCommand::PurgeCache(options) => self.purge_cache(&options),
            WorkerCommand::GetCacheStats => WorkerResult::Stats(self.cache_stats()),
        }
    }

    /// Perform one request, consulting the cache for GETs with `use_cache`.
    pub async fn request(&self, options: &RequestOptions) -> FetchOutcome {
        let key = cache_key(options.method, &options.url);
        let cacheable = options.method == HttpMethod::Get && options.use_cache;

        if cacheable {
            let ttl = Duration::from_millis(options.cache_ttl_ms);
            if let Some(cached) = self.cache.lock().get_fresh(&key, ttl) {
                tracing::debug!(key = %key, "Serving from cache");
                return FetchOutcome::Http(HttpResult::from_response(cached, 0, true));
            }
        }

        let started = Instant::now();
        match self.fetcher.fetch(options).await {
            Ok(response) => {
                let elapsed = started.elapsed().as_millis() as u64;
                if cacheable && response.is_success() {
                    self.cache.lock().insert(key, response.clone());
                }
                if !response.is_success() {
                    tracing::debug!(
                        method = options.method.as_str(),
                        url = %options.url,
                        status = response.status,
                        "Request returned error status"
                    );
                }
                FetchOutcome::Http(HttpResult::from_response(response, elapsed, false))
            }
            Err(e) => {
                tracing::warn!(
                    method = options.method.as_str(),
                    url = %options.url,
                    error = %e,
                    "Request failed"
                );
                FetchOutcome::Network(NetworkFailure::new(e.to_string()))
            }
        }
    }

    pub fn purge_cache(&self, options: &PurgeOptions) -> WorkerResult {
        match self.cache.lock().purge(options) {
            Ok(purged) => {
                tracing::debug!(count = purged.len(), "Cache purged");
                WorkerResult::Purged(PurgeReport { purged })
            }
            Err(e) => WorkerResult::Failed(WorkerFailure {
                error: format!("Invalid purge pattern: {}", e),
            }),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }
}
