//! In-memory result cache with per-entry time-to-live.
//!
//! The pipeline only needs `get` and `set`; keeping the trait that small
//! means the backend can be swapped without touching pipeline logic.
//! Entries are overwritten wholesale, there are no partial updates, and
//! concurrent writers to the same key race with last-write-wins.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::restaurant::Restaurant;

/// Minimal cache capability shared by every endpoint.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a result list. Expired entries behave like misses.
    async fn get(&self, key: &str) -> Option<Vec<Restaurant>>;

    /// Store a result list. `ttl = None` means the entry never expires.
    async fn set(&self, key: &str, value: Vec<Restaurant>, ttl: Option<Duration>);
}

struct Entry {
    value: Vec<Restaurant>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() >= expires_at,
            None => false,
        }
    }
}

/// Unbounded in-memory backend. Expiry is the only eviction.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<Restaurant>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired entries are dropped on read so the map does not
        // accumulate stale lists.
        self.entries.write().await.remove(key);
        None
    }

    async fn set(&self, key: &str, value: Vec<Restaurant>, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }
}
