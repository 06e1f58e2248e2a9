//! Read-through access to remote datasets
//!
//! A fetch consults the TTL cache first, then the remote call. When the remote
//! call fails while offline, the last stored payload is served regardless of
//! age, and the result is marked [`Freshness::Stale`] so callers can tell.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::network::NetworkMonitor;
use crate::cache::{CacheEntry, TtlCache};
use crate::clock::Clock;
use crate::error::{Result, SyncError};

/// Where a fetched value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Valid cache entry, no remote call made
    Cached,
    /// Remote call just succeeded
    Fresh,
    /// Remote call failed; last stored payload served
    Stale,
}

/// A fetched value and its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub freshness: Freshness,
    /// When the value was stored in (or fetched into) the cache
    pub stored_at: DateTime<Utc>,
}

impl<T> Fetched<T> {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Process-wide counters for the status surface
#[derive(Debug, Default)]
pub struct SyncCounters {
    api_calls: AtomicU64,
    errors: AtomicU64,
    data_version: AtomicU64,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SyncCounters {
    fn record_success(&self, at: DateTime<Utc>) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.data_version.fetch_add(1, Ordering::Relaxed);
        *self
            .last_sync
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(at);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful remote fetches
    pub fn api_call_count(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Bumped on every successful fresh fetch
    pub fn data_version(&self) -> u64 {
        self.data_version.load(Ordering::Relaxed)
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self
            .last_sync
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cache-first fetcher with stale fallback.
pub struct DataFetcher {
    cache: Arc<TtlCache>,
    monitor: Arc<NetworkMonitor>,
    clock: Arc<dyn Clock>,
    counters: SyncCounters,
}

impl DataFetcher {
    pub fn new(cache: Arc<TtlCache>, monitor: Arc<NetworkMonitor>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            monitor,
            clock,
            counters: SyncCounters::default(),
        }
    }

    pub fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Fetch the value stored under `key`, calling `remote` on a cache miss.
    ///
    /// With `use_cache` false the cache is not consulted before the remote
    /// call, but a successful result is still stored.
    ///
    /// # Errors
    ///
    /// While online, the remote error is returned as is. While offline,
    /// [`SyncError::NoCachedData`] is returned when nothing was ever stored
    /// under `key`.
    pub async fn fetch<T, F, Fut>(&self, key: &str, remote: F, use_cache: bool) -> Result<Fetched<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if use_cache
            && let Some(entry) = self.cache.get_entry(key)
        {
            match decode(entry, Freshness::Cached) {
                Ok(hit) => {
                    log::debug!("Cache hit: {}", key);
                    return Ok(hit);
                }
                Err(e) => log::warn!("Ignoring undecodable cache entry {}: {}", key, e),
            }
        }

        log::debug!("Cache miss: {}", key);
        match remote().await {
            Ok(value) => {
                let now = self.clock.now();
                self.cache.put(key, serde_json::to_value(&value)?);
                self.counters.record_success(now);
                Ok(Fetched {
                    value,
                    freshness: Freshness::Fresh,
                    stored_at: now,
                })
            }
            Err(err) => {
                self.counters.record_error();
                if self.monitor.is_online() {
                    return Err(err);
                }
                log::debug!("Fetch of {} failed offline: {}", key, err);
                self.stale(key).ok_or_else(|| {
                    SyncError::NoCachedData {
                        key: key.to_string(),
                    }
                    .into()
                })
            }
        }
    }

    /// Last stored value for `key` regardless of age, for callers that fall
    /// back after an online failure.
    pub fn stale<T: DeserializeOwned>(&self, key: &str) -> Option<Fetched<T>> {
        let entry = self.cache.get_stale(key)?;
        match decode(entry, Freshness::Stale) {
            Ok(fetched) => {
                log::warn!("Serving stale data for {}", key);
                Some(fetched)
            }
            Err(e) => {
                log::warn!("Ignoring undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }
}

fn decode<T: DeserializeOwned>(entry: CacheEntry, freshness: Freshness) -> Result<Fetched<T>> {
    Ok(Fetched {
        value: serde_json::from_value(entry.payload)?,
        freshness,
        stored_at: entry.stored_at,
    })
}
