use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde_json::Value;

pub const DEFAULT_TTL_SECS: i64 = 300;

struct CacheEntry {
    value: Value,
    inserted_at: DateTime<Utc>,
}

/// Time-bounded cache for read-only request results, keyed by the normalized
/// request URL. Entries older than the TTL are evicted lazily on lookup; there
/// is no capacity bound. Cheap to clone; all clones share one map.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Returns the stored value while it is younger than the TTL; an expired
    /// entry is removed and treated as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if Utc::now() - entry.inserted_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                debug!("cache entry expired: {key}");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts or overwrites the entry with the current timestamp.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: Utc::now(),
            },
        );
    }

    /// Empties the cache. Used for manual invalidation after a mutating
    /// operation that is known to stale prior reads.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
