//! In-memory response cache with a fixed TTL.
//!
//! Keyed by the full request URL. Expiry is checked on read: an entry
//! older than the TTL is dropped and never returned, so a stale value
//! can only force a re-fetch, never serve. Inserts sweep the map once it
//! grows past its capacity so a long-running process stays bounded.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::market_data::market_data_constants::{CACHE_MAX_ENTRIES, CACHE_TTL_SECS};
use crate::utils::Clock;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: DateTime<Utc>,
}

/// Shared response cache for the market data client
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::seconds(CACHE_TTL_SECS), CACHE_MAX_ENTRIES)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            clock,
        }
    }

    /// Look up a fresh entry, dropping it if the TTL has lapsed
    pub fn get(&self, url: &str) -> Option<Value> {
        let now = self.clock.now();
        let fresh = match self.entries.get(url) {
            Some(entry) if now - entry.fetched_at < self.ttl => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };
        if fresh.is_none() {
            self.entries.remove(url);
        }
        fresh
    }

    /// Store a response, overwriting any prior entry for the URL
    pub fn insert(&self, url: &str, value: Value) {
        if self.entries.len() >= self.max_entries {
            self.sweep();
        }
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                value,
                fetched_at: self.clock.now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries; if everything is still fresh, drop the oldest
    fn sweep(&self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);

        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.fetched_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
    }
}
