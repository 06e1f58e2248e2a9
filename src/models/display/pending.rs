//! Queued mutation display model

use serde::Serialize;
use tabled::Tabled;

use crate::sync::{MAX_RETRY_ATTEMPTS, RetryItem};

/// A mutation waiting in the retry queue
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct PendingDisplay {
    #[tabled(rename = "#")]
    pub id: u64,

    #[tabled(rename = "OPERATION")]
    pub operation: String,

    #[tabled(rename = "CHANGE")]
    pub description: String,

    #[tabled(rename = "ATTEMPTS")]
    pub attempts: String,

    #[tabled(rename = "QUEUED AT")]
    pub enqueued_at: String,
}

impl From<RetryItem> for PendingDisplay {
    fn from(item: RetryItem) -> Self {
        Self {
            id: item.id,
            operation: item.mutation.kind().to_string(),
            description: item.mutation.describe(),
            attempts: format!("{}/{}", item.attempts, MAX_RETRY_ATTEMPTS),
            enqueued_at: item.enqueued_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}
