//! Best-effort response cache owned by one executor.
//!
//! Entries are keyed `"METHOD:URL"`. Freshness is checked lazily on read and
//! stale entries are evicted by the read that finds them. Writes overwrite
//! unconditionally; concurrent fetches of the same key are not coalesced, so
//! the last one to complete wins.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use super::protocol::{CacheStats, FetchedResponse, HttpMethod, PurgeOptions};

pub fn cache_key(method: HttpMethod, url: &str) -> String {
    format!("{}:{}", method.as_str(), url)
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub stored_at: Instant,
    pub response: FetchedResponse,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Cached response for `key` if it is younger than `ttl`.
    ///
    /// An expired entry is removed and `None` is returned.
    pub fn get_fresh(&mut self, key: &str, ttl: Duration) -> Option<FetchedResponse> {
        let age = self.entries.get(key)?.stored_at.elapsed();
        if age < ttl {
            return self.entries.get(key).map(|entry| entry.response.clone());
        }
        tracing::trace!(key, age_ms = age.as_millis() as u64, "Evicting stale cache entry");
        self.entries.remove(key);
        None
    }

    pub fn insert(&mut self, key: String, response: FetchedResponse) {
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                response,
            },
        );
    }

    /// Evict entries according to `options` and return the evicted keys, sorted.
    pub fn purge(&mut self, options: &PurgeOptions) -> Result<Vec<String>, regex::Error> {
        let mut purged: Vec<String> = if let Some(url) = &options.url {
            let key = cache_key(HttpMethod::Get, url);
            self.entries
                .remove(&key)
                .map(|_| vec![key])
                .unwrap_or_default()
        } else if let Some(pattern) = &options.pattern {
            let regex = Regex::new(pattern)?;
            self.remove_where(|key, _| regex.is_match(key))
        } else if let Some(older_than_ms) = options.older_than_ms {
            let threshold = Duration::from_millis(older_than_ms);
            self.remove_where(|_, entry| entry.stored_at.elapsed() > threshold)
        } else {
            self.entries.drain().map(|(key, _)| key).collect()
        };
        purged.sort();
        Ok(purged)
    }

    /// Size, keys and an approximate byte footprint. Walks every entry.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        let approximate_bytes = self
            .entries
            .iter()
            .map(|(key, entry)| {
                key.len()
                    + serde_json::to_vec(&entry.response)
                        .map(|bytes| bytes.len())
                        .unwrap_or(0)
            })
            .sum();
        CacheStats {
            size: self.entries.len(),
            keys,
            approximate_bytes,
        }
    }

    fn remove_where<F>(&mut self, predicate: F) -> Vec<String>
    where
        F: Fn(&str, &CacheEntry) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, entry)| predicate(key.as_str(), entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.entries.remove(key);
        }
        doomed
    }
}
