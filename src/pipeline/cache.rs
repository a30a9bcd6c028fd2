use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::User;

/// Canonical key under which the parallel-loaded user set is cached
pub const USERS_CACHE_KEY: &str = "users";

/// Default time-to-live for cached payloads
pub const DEFAULT_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cache entry with its storage timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Vec<User>,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(payload: Vec<User>) -> Self {
        Self {
            payload,
            stored_at: Utc::now(),
        }
    }

    /// An entry is valid only while `now - stored_at < ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.stored_at)
            .to_std()
            .map(|elapsed| elapsed >= ttl)
            .unwrap_or(false)
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entry_count: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Expiring key-value store for user sets.
///
/// One fixed TTL covers the whole cache; expired entries read as absent and
/// are evicted on access. Lookups are exact, no partial-key matching.
#[derive(Clone)]
pub struct ExpiringCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    stats: Arc<Mutex<CacheStats>>,
    ttl: Duration,
}

impl ExpiringCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(CacheStats::default())),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Store a payload under `key` with the current timestamp, overwriting
    /// any prior entry.
    pub async fn put(&self, key: &str, payload: Vec<User>) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), CacheEntry::new(payload));
    }

    /// Return the payload while fresh. A stale entry counts as a miss and is
    /// evicted as a side effect.
    pub async fn get(&self, key: &str) -> Option<Vec<User>> {
        let result = {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some(entry) if entry.is_expired(self.ttl) => {
                    debug!("cache entry expired: {}", key);
                    entries.remove(key);
                    let mut stats = self.stats.lock().await;
                    stats.evictions += 1;
                    None
                }
                Some(entry) => Some(entry.payload.clone()),
                None => None,
            }
        };

        let mut stats = self.stats.lock().await;
        if result.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        result
    }

    /// Remove an entry unconditionally. Used before a forced refresh.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        entries.remove(key).is_some()
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().await.clone();
        stats.entry_count = self.entries.lock().await.len();
        stats
    }
}
