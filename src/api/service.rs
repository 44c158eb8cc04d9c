use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::bridge::Bridge;
use crate::executor::protocol::{
    CacheStats, FetchOutcome, HttpMethod, HttpResult, PurgeOptions, RequestOptions, WorkerCommand,
    WorkerResult, DEFAULT_CACHE_TTL_MS,
};
use crate::model::{Incident, IncidentId, IncidentStatus, NewIncident};
use crate::store::{creators, Action, Store};

use super::error::ApiError;

/// Name under which the facade expects its executor to be registered.
pub const API_WORKER_NAME: &str = "api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub worker: String,
    /// Whether GETs ask the executor to serve from and fill its cache.
    pub use_cache: bool,
    pub cache_ttl_ms: u64,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            worker: API_WORKER_NAME.to_string(),
            use_cache: true,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

/// Filter for listing incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
}

/// Typed incident API on top of the bridge.
///
/// Keeps the store's `loading` flag raised while at least one request is
/// outstanding, and records every failure in the store's error slice before
/// returning it.
#[derive(Clone)]
pub struct ApiService {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    store: Store,
    bridge: Bridge,
    settings: ApiSettings,
    pending: Mutex<HashSet<String>>,
    counter: AtomicU64,
    loading_sync: tokio::sync::Mutex<()>,
}

/// One tracked request in the pending set.
///
/// Dropping it without [`finish`](Self::finish) (the facade future was
/// cancelled) still removes the key; the `loading` update then runs on a
/// spawned task.
struct TrackedRequest {
    inner: Arc<ApiInner>,
    key: Option<String>,
}

impl TrackedRequest {
    async fn finish(mut self) {
        if let Some(key) = self.key.take() {
            self.inner.pending.lock().remove(&key);
            self.inner.sync_loading().await;
        }
    }
}

impl Drop for TrackedRequest {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else { return };
        self.inner.pending.lock().remove(&key);
        tracing::debug!(key = %key, "Tracked request dropped before completion");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move { inner.sync_loading().await });
            }
            Err(_) => tracing::warn!("No runtime to clear loading after cancelled request"),
        }
    }
}

impl ApiService {
    pub fn new(store: Store, bridge: Bridge, settings: ApiSettings) -> Self {
        Self {
            inner: Arc::new(ApiInner {
                store,
                bridge,
                settings,
                pending: Mutex::new(HashSet::new()),
                counter: AtomicU64::new(0),
                loading_sync: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.inner.settings
    }

    pub async fn get_incidents(&self) -> Result<Vec<Incident>, ApiError> {
        self.list_incidents(&IncidentQuery::default()).await
    }

    pub async fn list_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>, ApiError> {
        let outcome = async {
            let mut params = Vec::new();
            if let Some(status) = query.status {
                params.push(("status", status.as_str()));
            }
            let url = self.url("incidents", &params)?;
            let result = self.fetch("getIncidents", self.cached_get(url)).await?;
            decode(result)
        }
        .await;
        self.record(outcome).await
    }

    pub async fn get_incident_by_id(&self, id: IncidentId) -> Result<Incident, ApiError> {
        let outcome = async {
            let url = self.url(&format!("incidents/{}", id), &[])?;
            let result = self.fetch("getIncidentById", self.cached_get(url)).await?;
            decode(result)
        }
        .await;
        self.record(outcome).await
    }

    pub async fn create_incident(&self, data: NewIncident) -> Result<Incident, ApiError> {
        let outcome = async {
            if data.title.trim().is_empty() {
                return Err(ApiError::Validation("incident title is required".to_string()));
            }
            let body = serde_json::to_value(&data)
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            let url = self.url("incidents", &[])?;
            let options = RequestOptions::get(url)
                .with_method(HttpMethod::Post)
                .with_body(body)
                .with_cache(false);
            let result = self.fetch("createIncident", options).await?;
            self.invalidate_incidents().await;
            decode(result)
        }
        .await;
        self.record(outcome).await
    }

    pub async fn update_incident_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, ApiError> {
        let outcome = async {
            let url = self.url(&format!("incidents/{}/status", id), &[])?;
            let options = RequestOptions::get(url)
                .with_method(HttpMethod::Patch)
                .with_body(json!({ "status": status }))
                .with_cache(false);
            let result = self.fetch("updateIncidentStatus", options).await?;
            self.invalidate_incidents().await;
            decode(result)
        }
        .await;
        self.record(outcome).await
    }

    pub async fn delete_incident(&self, id: IncidentId) -> Result<(), ApiError> {
        let outcome = async {
            let url = self.url(&format!("incidents/{}", id), &[])?;
            let options = RequestOptions::get(url)
                .with_method(HttpMethod::Delete)
                .with_cache(false);
            self.fetch("deleteIncident", options).await?;
            self.invalidate_incidents().await;
            Ok::<(), ApiError>(())
        }
        .await;
        self.record(outcome).await
    }

    /// Evict cached responses; returns the evicted cache keys.
    pub async fn purge_cache(&self, options: PurgeOptions) -> Result<Vec<String>, ApiError> {
        let outcome = async {
            match self.call("purgeCache", WorkerCommand::PurgeCache(options)).await? {
                WorkerResult::Purged(report) => Ok(report.purged),
                WorkerResult::Failed(failure) => Err(ApiError::Worker(failure.error)),
                other => Err(unexpected("purgeCache", &other)),
            }
        }
        .await;
        self.record(outcome).await
    }

    pub async fn get_cache_stats(&self) -> Result<CacheStats, ApiError> {
        let outcome = async {
            match self.call("getCacheStats", WorkerCommand::GetCacheStats).await? {
                WorkerResult::Stats(stats) => Ok(stats),
                WorkerResult::Failed(failure) => Err(ApiError::Worker(failure.error)),
                other => Err(unexpected("getCacheStats", &other)),
            }
        }
        .await;
        self.record(outcome).await
    }

    /// Page navigation: forget tracked requests.
    ///
    /// In-flight requests are not aborted and their replies still resolve.
    pub fn on_navigation(&self) {
        let cleared = {
            let mut pending = self.inner.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        tracing::debug!(cleared, "Navigation cleared pending request tracking");
    }

    /// Number of tracked outstanding requests.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.lock().len()
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        let base = self.inner.settings.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ApiError::Validation(format!("invalid URL for '{}': {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }

    fn cached_get(&self, url: String) -> RequestOptions {
        RequestOptions::get(url)
            .with_cache(self.inner.settings.use_cache)
            .with_ttl(self.inner.settings.cache_ttl_ms)
    }

    async fn fetch(&self, label: &str, options: RequestOptions) -> Result<HttpResult, ApiError> {
        let method = options.method;
        let url = options.url.clone();
        match self.call(label, WorkerCommand::Request(options)).await? {
            WorkerResult::Fetch(FetchOutcome::Http(result)) if result.success => {
                tracing::debug!(
                    method = method.as_str(),
                    url = %url,
                    status = result.status,
                    from_cache = result.from_cache,
                    response_time_ms = result.response_time,
                    "Request completed"
                );
                Ok(result)
            }
            WorkerResult::Fetch(FetchOutcome::Http(result)) => Err(ApiError::from_http(&result)),
            WorkerResult::Fetch(FetchOutcome::Network(failure)) => {
                Err(ApiError::Network(failure.error))
            }
            WorkerResult::Failed(failure) => Err(ApiError::Worker(failure.error)),
            other => Err(unexpected(label, &other)),
        }
    }

    /// Send one command through the bridge with loading tracking around it.
    async fn call(&self, label: &str, command: WorkerCommand) -> Result<WorkerResult, ApiError> {
        let reply = self.inner.bridge.send(&self.inner.settings.worker, command)?;
        let tracked = self.begin(label).await;
        let outcome = reply.await;
        tracked.finish().await;
        Ok(outcome?)
    }

    async fn begin(&self, label: &str) -> TrackedRequest {
        let key = format!(
            "{}#{}",
            label,
            self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1
        );
        self.inner.pending.lock().insert(key.clone());
        let tracked = TrackedRequest {
            inner: Arc::clone(&self.inner),
            key: Some(key),
        };
        self.inner.sync_loading().await;
        tracked
    }

    /// Mutations change what the incident GETs return.
    async fn invalidate_incidents(&self) {
        let prefix = match self.url("incidents", &[]) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping cache invalidation");
                return;
            }
        };
        let pattern = format!("^GET:{}", regex::escape(&prefix));
        match self
            .call("purgeCache", WorkerCommand::PurgeCache(PurgeOptions::pattern(pattern)))
            .await
        {
            Ok(WorkerResult::Purged(report)) => {
                tracing::debug!(purged = report.purged.len(), "Invalidated cached incidents");
            }
            Ok(other) => {
                tracing::warn!(result = ?other, "Cache invalidation returned unexpected result");
            }
            Err(e) => tracing::warn!(error = %e, "Cache invalidation failed"),
        }
    }

    /// Record a failure in the store's error slice, then hand it back.
    async fn record<T>(&self, outcome: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(err) = &outcome {
            tracing::warn!(code = %err.code(), error = %err, "API request failed");
            self.dispatch(creators::set_error(err.normalize())).await;
        }
        outcome
    }

    async fn dispatch(&self, action: Action) {
        self.inner.dispatch(action).await;
    }
}

impl ApiInner {
    /// Bring the store's `loading` flag in line with the pending set.
    ///
    /// Decisions and their dispatches are serialized, so the last one applied
    /// always reflects the latest pending set.
    async fn sync_loading(&self) {
        let _serial = self.loading_sync.lock().await;
        let wanted = !self.pending.lock().is_empty();
        if self.store.get_state().loading != wanted {
            self.dispatch(creators::set_loading(wanted)).await;
        }
    }

    async fn dispatch(&self, action: Action) {
        match self.store.dispatch(action) {
            Ok(dispatch) => {
                if let Err(e) = dispatch.await {
                    tracing::warn!(error = %e, "Store dispatch from API facade failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "Store rejected API facade action"),
        }
    }
}

fn decode<T: DeserializeOwned>(result: HttpResult) -> Result<T, ApiError> {
    serde_json::from_value(result.data).map_err(|e| ApiError::Decode(e.to_string()))
}

fn unexpected(label: &str, result: &WorkerResult) -> ApiError {
    ApiError::Decode(format!("unexpected result for {}: {:?}", label, result))
}
