//! Composition root of the offline sync core
//!
//! [`SyncEngine`] owns the cache, the network monitor, the fetcher and the
//! retry queue, and is the only handle the UI layer needs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::fetcher::{DataFetcher, Fetched};
use super::network::{Connectivity, NetworkMonitor, Transition};
use super::notify::{Notifier, NotifyLevel};
use super::queue::{FlushReport, Mutation, MutationResult, RetryItem, RetryQueue};
use crate::cache::{TtlCache, cache_key, key_prefix};
use crate::client::{CropRecord, CropRecordDraft, CropStageApi, ListFlags, Scope};
use crate::clock::Clock;
use crate::error::{Result, SyncError};
use crate::insights::{Alert, AnalyticsSnapshot, DismissedAlerts, aggregate, evaluate};

const RECORDS_ENDPOINT: &str = "crop_stages";
const ANALYTICS_ENDPOINT: &str = "analytics";

/// Cache key of a record listing.
pub fn records_key(scope: Scope, flags: ListFlags) -> String {
    cache_key(RECORDS_ENDPOINT, &scope.to_string(), &flags.query_params())
}

/// Cache key of the last analytics snapshot for a scope.
pub fn analytics_key(scope: Scope) -> String {
    cache_key(ANALYTICS_ENDPOINT, &scope.to_string(), &[])
}

/// What happened to a submitted mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The API accepted it
    Applied(MutationResult),
    /// Held in the retry queue under this id
    Queued { retry_id: u64 },
}

/// Read-only counters for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStats {
    pub api_call_count: u64,
    pub error_count: u64,
    pub cache_size: usize,
    pub data_version: u64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub pending_mutations: usize,
    pub online: bool,
}

pub struct SyncEngine<C: CropStageApi> {
    api: C,
    cache: Arc<TtlCache>,
    monitor: Arc<NetworkMonitor>,
    fetcher: DataFetcher,
    queue: RetryQueue,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl<C: CropStageApi> SyncEngine<C> {
    /// Build an engine seeded with the platform's current connectivity.
    pub fn new(
        api: C,
        initial: Connectivity,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(TtlCache::new(clock.clone()));
        let monitor = Arc::new(NetworkMonitor::new(initial));
        Self {
            fetcher: DataFetcher::new(cache.clone(), monitor.clone(), clock.clone()),
            queue: RetryQueue::new(clock.clone()),
            api,
            cache,
            monitor,
            notifier,
            clock,
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &C {
        &self.api
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Crop records for `scope`, falling back to the last stored listing
    /// whenever the API cannot be reached.
    pub async fn records(
        &self,
        scope: Scope,
        flags: ListFlags,
        use_cache: bool,
    ) -> Result<Fetched<Vec<CropRecord>>> {
        let key = records_key(scope, flags);
        let result = self
            .fetcher
            .fetch(&key, || self.api.list_records(scope, flags), use_cache)
            .await;

        match result {
            Err(err) if self.monitor.is_online() => self.fetcher.stale(&key).ok_or(err),
            other => other,
        }
    }

    /// Analytics for `scope`.
    ///
    /// Never fails: when the records cannot be fetched the last snapshot is
    /// returned, or an empty one with [`crate::insights::DataQuality::Error`].
    pub async fn analytics(&self, scope: Scope, use_cache: bool) -> AnalyticsSnapshot {
        let key = analytics_key(scope);
        match self.records(scope, ListFlags::analytics(), use_cache).await {
            Ok(fetched) => {
                let snapshot = aggregate(&fetched.value, self.clock.now());
                match serde_json::to_value(&snapshot) {
                    Ok(payload) => self.cache.put(&key, payload),
                    Err(e) => log::warn!("Could not cache analytics snapshot: {}", e),
                }
                snapshot
            }
            Err(err) => {
                log::warn!("Analytics for {} unavailable: {}", scope, err);
                self.cache
                    .get_stale(&key)
                    .and_then(|entry| serde_json::from_value(entry.payload).ok())
                    .unwrap_or_else(|| AnalyticsSnapshot::error(self.clock.now()))
            }
        }
    }

    /// Alerts for `scope` that have not been dismissed.
    pub async fn alerts(
        &self,
        scope: Scope,
        dismissed: &DismissedAlerts,
        use_cache: bool,
    ) -> Result<Vec<Alert>> {
        let fetched = self.records(scope, ListFlags::default(), use_cache).await?;
        Ok(dismissed.visible(evaluate(&fetched.value, self.clock.now())))
    }

    pub async fn create(&self, scope: Scope, draft: CropRecordDraft) -> Result<MutationOutcome> {
        self.submit(Mutation::Create { scope, draft }).await
    }

    pub async fn update(
        &self,
        scope: Scope,
        record_id: u64,
        draft: CropRecordDraft,
    ) -> Result<MutationOutcome> {
        self.submit(Mutation::Update {
            scope,
            record_id,
            draft,
        })
        .await
    }

    pub async fn delete(&self, scope: Scope, record_id: u64) -> Result<MutationOutcome> {
        self.submit(Mutation::Delete { scope, record_id }).await
    }

    /// Apply a mutation now, or queue it when it cannot be applied yet.
    ///
    /// Mutations are queued without a remote attempt while offline, and
    /// behind any already-queued mutations so replay order is preserved.
    ///
    /// # Errors
    ///
    /// Failures that will never succeed on replay (4xx-equivalent) are
    /// returned instead of being queued.
    pub async fn submit(&self, mutation: Mutation) -> Result<MutationOutcome> {
        if !self.monitor.is_online() {
            let retry_id = self.queue.enqueue(mutation.clone());
            self.notifier.notify(
                NotifyLevel::Info,
                &format!("Offline: {} saved and will sync when back online", mutation.describe()),
            );
            return Ok(MutationOutcome::Queued { retry_id });
        }

        if !self.queue.is_empty() {
            let retry_id = self.queue.enqueue(mutation);
            let report = self.flush().await;
            return settle(retry_id, report);
        }

        match mutation.apply(&self.api).await {
            Ok(result) => {
                self.invalidate_records();
                self.notifier
                    .notify(NotifyLevel::Success, &format!("Saved {}", mutation.describe()));
                Ok(MutationOutcome::Applied(result))
            }
            Err(err) if err.is_retryable() => {
                self.fetcher.counters().record_error();
                let retry_id = self.queue.enqueue(mutation.clone());
                self.queue.defer(retry_id, err.retry_after());
                self.notifier.notify(
                    NotifyLevel::Warning,
                    &format!("{} failed and was queued for retry: {}", mutation.describe(), err),
                );
                Ok(MutationOutcome::Queued { retry_id })
            }
            Err(err) => {
                self.fetcher.counters().record_error();
                if err.reached_server() {
                    self.invalidate_records();
                }
                Err(err)
            }
        }
    }

    /// Replay queued mutations. See [`RetryQueue::flush`].
    pub async fn flush(&self) -> FlushReport {
        let report = self
            .queue
            .flush(&self.api, &self.monitor, self.notifier.as_ref())
            .await;
        if !report.replayed.is_empty() || !report.dropped.is_empty() {
            self.invalidate_records();
        }
        report
    }

    /// Wait requested by the API before the head of the queue is replayed.
    pub fn retry_after(&self) -> Option<Duration> {
        self.queue.retry_after()
    }

    /// Feed a platform connectivity notification.
    ///
    /// Going online flushes the queue and returns the report.
    pub async fn connectivity_changed(&self, connectivity: Connectivity) -> Option<FlushReport> {
        match self.monitor.report(connectivity)? {
            Transition::WentOnline => {
                let pending = self.queue.len();
                if pending > 0 {
                    self.notifier.notify(
                        NotifyLevel::Info,
                        &format!("Back online, syncing {} pending change(s)", pending),
                    );
                }
                Some(self.flush().await)
            }
            Transition::WentOffline => {
                self.notifier.notify(
                    NotifyLevel::Warning,
                    "Offline: changes will be queued until the connection returns",
                );
                None
            }
        }
    }

    /// Drop one cache entry so the next read goes to the API.
    pub fn invalidate(&self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Queued mutations, head first.
    pub fn pending(&self) -> Vec<RetryItem> {
        self.queue.snapshot()
    }

    pub fn stats(&self) -> SyncStats {
        let counters = self.fetcher.counters();
        SyncStats {
            api_call_count: counters.api_call_count(),
            error_count: counters.error_count(),
            cache_size: self.cache.len(),
            data_version: counters.data_version(),
            last_sync_time: counters.last_sync_time(),
            pending_mutations: self.queue.len(),
            online: self.monitor.is_online(),
        }
    }

    fn invalidate_records(&self) {
        let removed = self
            .cache
            .invalidate_prefix(&key_prefix(RECORDS_ENDPOINT, None));
        log::debug!("Invalidated {} cached listing(s)", removed);
    }
}

// Outcome of a mutation that was queued behind others and flushed at once.
fn settle(retry_id: u64, report: FlushReport) -> Result<MutationOutcome> {
    if let Some(replayed) = report.replayed.into_iter().find(|r| r.id == retry_id) {
        return Ok(MutationOutcome::Applied(replayed.result));
    }
    if let Some(err) = report.dropped.into_iter().find(|err| match err {
        SyncError::RetryExhausted { id, .. } | SyncError::Rejected { id, .. } => *id == retry_id,
        _ => false,
    }) {
        return Err(err.into());
    }
    Ok(MutationOutcome::Queued { retry_id })
}
