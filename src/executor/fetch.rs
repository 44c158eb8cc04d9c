//! Network side of the executor.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use thiserror::Error;

use super::protocol::{FetchedResponse, HttpMethod, RequestOptions};

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, refused connection, TLS, timeout).
    #[error("Request to '{url}' failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response started but its body could not be read.
    #[error("Failed to read response body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The URL could not be parsed, so nothing was sent.
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Performs one HTTP exchange. Non-2xx statuses are responses, not errors.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, options: &RequestOptions) -> Result<FetchedResponse, FetchError>;
}

#[derive(Debug, Clone, Copy)]
pub struct FetchTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(25),
        }
    }
}

/// [`HttpFetcher`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeouts: FetchTimeouts) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, options: &RequestOptions) -> Result<FetchedResponse, FetchError> {
        let url = Url::parse(&options.url).map_err(|e| FetchError::InvalidUrl {
            url: options.url.clone(),
            reason: e.to_string(),
        })?;
        let mut builder = self
            .client
            .request(to_reqwest_method(options.method), url)
            .header("Accept", "application/json");
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| FetchError::Connection {
                url: options.url.clone(),
                source,
            })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let text = response.text().await.map_err(|source| FetchError::Body {
            url: options.url.clone(),
            source,
        })?;

        Ok(FetchedResponse {
            status: status.as_u16(),
            status_text,
            headers,
            data: parse_body(&text),
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// JSON bodies are parsed; anything else is kept as a string, empty as null.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_body_handles_json_text_and_empty() {
        assert_eq!(parse_body(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(parse_body("plain"), json!("plain"));
        assert_eq!(parse_body("  "), Value::Null);
    }

    #[tokio::test]
    async fn malformed_url_fails_before_sending() {
        let fetcher = ReqwestFetcher::new(FetchTimeouts::default()).unwrap();
        let err = fetcher
            .fetch(&RequestOptions::get("incidents/without/host"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(err.to_string().contains("incidents/without/host"));
    }
}
