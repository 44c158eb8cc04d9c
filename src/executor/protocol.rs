//! Message contract between the bridge and a background executor.
//!
//! ```text
//! caller ──{id, action, payload}──→ executor
//! caller ←──────{id, result}──────── executor
//! caller ←────{type: "init"}──────── executor   (once, uncorrelated)
//! ```
//!
//! The types derive serde so the contract can be carried over any
//! serializing transport, but the in-process channels move them as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default freshness bound for cached GET responses.
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Payload of the `request` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(rename = "cacheTTL", default = "default_cache_ttl")]
    pub cache_ttl_ms: u64,
}

fn default_use_cache() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

impl RequestOptions {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            body: None,
            use_cache: true,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.cache_ttl_ms = ttl_ms;
        self
    }
}

/// Payload of the `purgeCache` action.
///
/// The modes are mutually exclusive and checked in order: `url`, then
/// `pattern`, then `older_than_ms`; with none set the whole cache is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "olderThan", default, skip_serializing_if = "Option::is_none")]
    pub older_than_ms: Option<u64>,
}

impl PurgeOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn older_than(ms: u64) -> Self {
        Self {
            older_than_ms: Some(ms),
            ..Self::default()
        }
    }
}

/// Action plus payload of an inbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum WorkerCommand {
    Request(RequestOptions),
    PurgeCache(PurgeOptions),
    GetCacheStats,
}

impl WorkerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::PurgeCache(_) => "purgeCache",
            Self::GetCacheStats => "getCacheStats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: String,
    #[serde(flatten)]
    pub command: WorkerCommand,
}

/// Response data as it came off the wire (or out of the cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of a `request` that reached the server (or was served from cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResult {
    pub success: bool,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
    /// Milliseconds spent on the network; 0 for cache hits.
    pub response_time: u64,
    #[serde(default)]
    pub from_cache: bool,
}

impl HttpResult {
    pub fn from_response(response: FetchedResponse, response_time: u64, from_cache: bool) -> Self {
        Self {
            success: response.is_success(),
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            data: response.data,
            response_time,
            from_cache,
        }
    }
}

/// Transport-level failure (DNS, refused connection, TLS...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFailure {
    pub success: bool,
    pub error: String,
    pub is_network_error: bool,
}

impl NetworkFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            is_network_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchOutcome {
    Http(HttpResult),
    Network(NetworkFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub purged: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
    /// Rough serialized size of keys and cached responses, in bytes.
    pub approximate_bytes: usize,
}

/// The executor could not carry out the command at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerResult {
    Fetch(FetchOutcome),
    Purged(PurgeReport),
    Stats(CacheStats),
    Failed(WorkerFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub result: WorkerResult,
}

/// Everything an executor sends back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    /// Readiness announcement, sent once before any response.
    Init {
        #[serde(rename = "type")]
        kind: InitTag,
        message: String,
    },
    Response(ResponseEnvelope),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitTag {
    Init,
}

impl WorkerMessage {
    pub fn ready(message: impl Into<String>) -> Self {
        Self::Init {
            kind: InitTag::Init,
            message: message.into(),
        }
    }
}

/// The caller's end of a running executor: where to post envelopes, where
/// replies arrive, and the task running it (if the caller owns one).
pub struct WorkerEndpoint {
    pub outbound: mpsc::UnboundedSender<RequestEnvelope>,
    pub inbound: mpsc::UnboundedReceiver<WorkerMessage>,
    pub task: Option<JoinHandle<()>>,
}
