//! In-memory TTL cache for fetched datasets
//!
//! Expiry is lazy: `get` ignores entries older than [`CACHE_TTL`] but never
//! removes them, so the last payload for a key stays available as a stale
//! fallback until it is overwritten or invalidated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::CACHE_TTL;
use crate::clock::Clock;

/// A cached payload with the time it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
}

/// Keyed store of previously fetched payloads.
///
/// Writes to the same key are last-write-wins.
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Payload for `key` if it was stored less than [`CACHE_TTL`] ago.
    #[allow(dead_code)]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.payload)
    }

    /// Like [`TtlCache::get`], keeping the storage timestamp.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let entries = self.lock();
        let entry = entries.get(key)?;
        if is_valid(entry, now) {
            Some(entry.clone())
        } else {
            log::debug!("Cache expired: {}", key);
            None
        }
    }

    /// Last stored entry for `key`, regardless of age.
    pub fn get_stale(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Insert or replace the payload for `key`, stamped with the current time.
    pub fn put(&self, key: &str, payload: Value) {
        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
        };
        self.lock().insert(key.to_string(), entry);
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Number of entries held, valid or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn is_valid(entry: &CacheEntry, now: DateTime<Utc>) -> bool {
    // A negative age (clock stepped back) counts as fresh.
    match (now - entry.stored_at).to_std() {
        Ok(age) => age < CACHE_TTL,
        Err(_) => true,
    }
}
