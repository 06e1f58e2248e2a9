//! Farm API client

use async_trait::async_trait;

use crate::error::Result;

#[cfg(test)]
pub mod fixtures;
pub mod farm;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use farm::FarmClient;
#[cfg(test)]
pub use mock::MockFarmClient;
pub use models::{CropRecord, CropRecordDraft, CropStage, HealthStatus, ListFlags, Scope};

/// Crop stage operations of the farm API.
///
/// The sync core only ever talks to the remote through this trait, so the
/// HTTP client and the test mock are interchangeable.
#[async_trait]
pub trait CropStageApi: Send + Sync {
    /// List crop stage records for a scope, with optional projections.
    async fn list_records(&self, scope: Scope, flags: ListFlags) -> Result<Vec<CropRecord>>;

    /// Create a record and return it as stored.
    async fn create_record(&self, scope: Scope, draft: &CropRecordDraft) -> Result<CropRecord>;

    /// Replace a record's fields and return it as stored.
    async fn update_record(
        &self,
        scope: Scope,
        record_id: u64,
        draft: &CropRecordDraft,
    ) -> Result<CropRecord>;

    /// Delete a record.
    async fn delete_record(&self, scope: Scope, record_id: u64) -> Result<()>;
}
