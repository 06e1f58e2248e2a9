//! FIFO retry queue for mutations that could not reach the API
//!
//! Items are replayed strictly in enqueue order, one at a time. A failing head
//! stays at the front with its attempt count bumped and ends the flush pass,
//! so later mutations never overtake an earlier one against the same record.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::network::NetworkMonitor;
use super::notify::{Notifier, NotifyLevel};
use crate::client::{CropRecord, CropRecordDraft, CropStageApi, Scope};
use crate::clock::Clock;
use crate::error::{Result, SyncError};

/// Failed replays allowed before an item is dropped.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Kind of remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => f.write_str("create"),
            MutationKind::Update => f.write_str("update"),
            MutationKind::Delete => f.write_str("delete"),
        }
    }
}

/// A remote write with everything needed to replay it
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create {
        scope: Scope,
        draft: CropRecordDraft,
    },
    Update {
        scope: Scope,
        record_id: u64,
        draft: CropRecordDraft,
    },
    Delete {
        scope: Scope,
        record_id: u64,
    },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create { .. } => MutationKind::Create,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Mutation::Create { scope, .. }
            | Mutation::Update { scope, .. }
            | Mutation::Delete { scope, .. } => *scope,
        }
    }

    /// e.g. `update of crop stage 5`, `create of batch B-12`
    pub fn describe(&self) -> String {
        match self {
            Mutation::Create { draft, .. } => format!("create of batch {}", draft.batch_code),
            Mutation::Update { record_id, .. } => format!("update of crop stage {}", record_id),
            Mutation::Delete { record_id, .. } => format!("delete of crop stage {}", record_id),
        }
    }

    /// Send this mutation to the API.
    pub async fn apply<C: CropStageApi + ?Sized>(&self, api: &C) -> Result<MutationResult> {
        match self {
            Mutation::Create { scope, draft } => {
                api.create_record(*scope, draft).await.map(MutationResult::Created)
            }
            Mutation::Update {
                scope,
                record_id,
                draft,
            } => api
                .update_record(*scope, *record_id, draft)
                .await
                .map(MutationResult::Updated),
            Mutation::Delete { scope, record_id } => {
                api.delete_record(*scope, *record_id).await?;
                Ok(MutationResult::Deleted(*record_id))
            }
        }
    }
}

/// What the API returned for an applied mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationResult {
    Created(CropRecord),
    Updated(CropRecord),
    Deleted(u64),
}

/// A queued mutation awaiting replay
#[derive(Debug, Clone, PartialEq)]
pub struct RetryItem {
    /// Monotonic queue token
    pub id: u64,
    pub mutation: Mutation,
    /// Failed replays so far
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Wait the API asked for after the last failure
    pub retry_after: Option<Duration>,
}

/// How a flush pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushStatus {
    /// Queue is empty
    Drained,
    /// Stopped on a failing head; it will be retried on the next flush
    Blocked,
    /// Network is down; nothing was attempted past this point
    Offline,
    /// Another flush was in progress
    AlreadyRunning,
}

/// A queued mutation that reached the API
#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    /// Queue id the item was enqueued under
    pub id: u64,
    pub result: MutationResult,
}

/// Outcome of one flush pass
#[derive(Debug)]
pub struct FlushReport {
    pub status: FlushStatus,
    /// Mutations that reached the API, in replay order
    pub replayed: Vec<Replayed>,
    /// Items dropped for good (exhausted or rejected)
    pub dropped: Vec<SyncError>,
    /// Items still queued after the pass
    pub remaining: usize,
}

impl FlushReport {
    fn new(status: FlushStatus) -> Self {
        Self {
            status,
            replayed: Vec::new(),
            dropped: Vec::new(),
            remaining: 0,
        }
    }
}

/// Ordered set of pending mutations.
pub struct RetryQueue {
    items: Mutex<VecDeque<RetryItem>>,
    next_id: AtomicU64,
    // Held for the duration of a flush; at most one replay is ever in flight.
    flush_lock: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl RetryQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            flush_lock: tokio::sync::Mutex::new(()),
            clock,
        }
    }

    /// Append a mutation with zero attempts. Returns its queue id.
    pub fn enqueue(&self, mutation: Mutation) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        log::debug!("Queued #{}: {}", id, mutation.describe());
        self.lock().push_back(RetryItem {
            id,
            mutation,
            attempts: 0,
            enqueued_at: self.clock.now(),
            retry_after: None,
        });
        id
    }

    /// Record the wait the API asked for before item `id` is replayed.
    pub fn defer(&self, id: u64, retry_after: Option<Duration>) {
        if let Some(item) = self.lock().iter_mut().find(|item| item.id == id) {
            item.retry_after = retry_after;
        }
    }

    /// Wait requested for the head item, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        self.lock().front().and_then(|item| item.retry_after)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the pending items, head first.
    pub fn snapshot(&self) -> Vec<RetryItem> {
        self.lock().iter().cloned().collect()
    }

    /// Replay pending items in order until the queue drains, a replay fails,
    /// or the network goes away.
    pub async fn flush<C: CropStageApi + ?Sized>(
        &self,
        api: &C,
        monitor: &NetworkMonitor,
        notifier: &dyn Notifier,
    ) -> FlushReport {
        let Ok(_guard) = self.flush_lock.try_lock() else {
            log::debug!("Flush already in progress");
            let mut report = FlushReport::new(FlushStatus::AlreadyRunning);
            report.remaining = self.len();
            return report;
        };

        let mut report = FlushReport::new(FlushStatus::Drained);

        loop {
            if !monitor.is_online() {
                report.status = FlushStatus::Offline;
                break;
            }

            let Some(head) = self.lock().front().cloned() else {
                report.status = FlushStatus::Drained;
                break;
            };

            if head.attempts >= MAX_RETRY_ATTEMPTS {
                self.remove_head(head.id);
                let err = SyncError::RetryExhausted {
                    id: head.id,
                    operation: head.mutation.kind(),
                    attempts: head.attempts,
                };
                notifier.notify(
                    NotifyLevel::Error,
                    &format!("Could not sync {}: {}", head.mutation.describe(), err),
                );
                report.dropped.push(err);
                continue;
            }

            match head.mutation.apply(api).await {
                Ok(result) => {
                    self.remove_head(head.id);
                    notifier.notify(
                        NotifyLevel::Success,
                        &format!("Synced {}", head.mutation.describe()),
                    );
                    report.replayed.push(Replayed {
                        id: head.id,
                        result,
                    });
                }
                Err(e) if !e.is_retryable() => {
                    self.remove_head(head.id);
                    let err = SyncError::Rejected {
                        id: head.id,
                        operation: head.mutation.kind(),
                        reason: e.to_string(),
                    };
                    notifier.notify(
                        NotifyLevel::Error,
                        &format!("Could not sync {}: {}", head.mutation.describe(), e),
                    );
                    report.dropped.push(err);
                }
                Err(e) => {
                    let attempts = self.bump_head(head.id, e.retry_after());
                    notifier.notify(
                        NotifyLevel::Warning,
                        &format!(
                            "Sync of {} failed (attempt {}/{}): {}",
                            head.mutation.describe(),
                            attempts,
                            MAX_RETRY_ATTEMPTS,
                            e
                        ),
                    );
                    report.status = FlushStatus::Blocked;
                    break;
                }
            }
        }

        report.remaining = self.len();
        log::debug!(
            "Flush finished: {:?}, {} replayed, {} dropped, {} remaining",
            report.status,
            report.replayed.len(),
            report.dropped.len(),
            report.remaining
        );
        report
    }

    // Only the flusher touches the head, so it is still `id` here.
    fn remove_head(&self, id: u64) {
        let mut items = self.lock();
        if items.front().is_some_and(|item| item.id == id) {
            items.pop_front();
        }
    }

    fn bump_head(&self, id: u64, retry_after: Option<Duration>) -> u32 {
        let mut items = self.lock();
        match items.front_mut() {
            Some(item) if item.id == id => {
                item.attempts += 1;
                item.retry_after = retry_after;
                item.attempts
            }
            _ => 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RetryItem>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
