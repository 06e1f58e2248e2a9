//! Mock farm API client for testing
//!
//! Provides an in-memory implementation of [`CropStageApi`] for unit testing
//! without making real API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CropRecord, CropRecordDraft, CropStageApi, ListFlags, Scope};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// Configure records and failures via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockFarmClient::new()
///     .with_records(vec![CropRecordBuilder::new(1).build()])
///     .await
///     .with_errors(2, || ApiError::Network("down".into()))
///     .await;
/// ```
pub struct MockFarmClient {
    /// Records served by list and mutated by create/update/delete
    records: Arc<Mutex<Vec<CropRecord>>>,
    /// Next ID handed out by create_record
    next_id: Arc<Mutex<u64>>,
    /// Errors returned by the next calls, one per call, in order
    errors: Arc<Mutex<VecDeque<ApiError>>>,
    /// Error factory applied to every call while set
    failing: Arc<Mutex<Option<fn() -> ApiError>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Captured calls for ordering assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Default for MockFarmClient {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1000)),
            errors: Arc::new(Mutex::new(VecDeque::new())),
            failing: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_records: usize,
    pub create_record: usize,
    pub update_record: usize,
    pub delete_record: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.list_records + self.create_record + self.update_record + self.delete_record
    }

    pub fn mutations(&self) -> usize {
        self.create_record + self.update_record + self.delete_record
    }
}

/// A captured API call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    /// The API method called (e.g., "update_record")
    pub method: &'static str,
    pub scope: Scope,
    /// Target record for update/delete
    pub record_id: Option<u64>,
    /// Batch code of the submitted draft for create/update
    pub batch_code: Option<String>,
    /// Whether the call was answered with an error
    pub failed: bool,
}

impl MockFarmClient {
    /// Create a new mock client with no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure records returned from list_records.
    pub async fn with_records(self, records: Vec<CropRecord>) -> Self {
        *self.records.lock().await = records;
        self
    }

    /// Fail the next `count` calls with errors built by `make`.
    pub async fn with_errors(self, count: usize, make: fn() -> ApiError) -> Self {
        self.push_errors(count, make).await;
        self
    }

    /// Queue `count` more failures on a live mock.
    pub async fn push_errors(&self, count: usize, make: fn() -> ApiError) {
        let mut errors = self.errors.lock().await;
        for _ in 0..count {
            errors.push_back(make());
        }
    }

    /// Fail every call until [`MockFarmClient::recover`] is called.
    pub async fn go_down(&self, make: fn() -> ApiError) {
        *self.failing.lock().await = Some(make);
    }

    pub async fn recover(&self) {
        *self.failing.lock().await = None;
        self.errors.lock().await.clear();
    }

    /// Get call counts for verification.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Get captured calls for verification.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Current server-side records.
    pub async fn records(&self) -> Vec<CropRecord> {
        self.records.lock().await.clone()
    }

    /// Record the call and return the configured failure, if any.
    async fn check_error(
        &self,
        method: &'static str,
        scope: Scope,
        record_id: Option<u64>,
        draft: Option<&CropRecordDraft>,
    ) -> Result<()> {
        {
            let mut counts = self.call_count.lock().await;
            match method {
                "list_records" => counts.list_records += 1,
                "create_record" => counts.create_record += 1,
                "update_record" => counts.update_record += 1,
                _ => counts.delete_record += 1,
            }
        }

        let error = match self.errors.lock().await.pop_front() {
            Some(e) => Some(e),
            None => self.failing.lock().await.map(|make| make()),
        };

        self.captured_requests.lock().await.push(CapturedRequest {
            method,
            scope,
            record_id,
            batch_code: draft.map(|d| d.batch_code.clone()),
            failed: error.is_some(),
        });

        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CropStageApi for MockFarmClient {
    async fn list_records(&self, scope: Scope, _flags: ListFlags) -> Result<Vec<CropRecord>> {
        self.check_error("list_records", scope, None, None).await?;
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| scope.farm_id().is_none_or(|farm| r.farm == farm))
            .cloned()
            .collect())
    }

    async fn create_record(&self, scope: Scope, draft: &CropRecordDraft) -> Result<CropRecord> {
        self.check_error("create_record", scope, None, Some(draft))
            .await?;
        let id = {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            *next_id
        };
        let record = draft
            .clone()
            .into_record(id, scope.farm_id().unwrap_or(1));
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        scope: Scope,
        record_id: u64,
        draft: &CropRecordDraft,
    ) -> Result<CropRecord> {
        self.check_error("update_record", scope, Some(record_id), Some(draft))
            .await?;
        let mut records = self.records.lock().await;
        let existing = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| ApiError::NotFound(format!("Crop stage {}", record_id)))?;
        let updated = draft.clone().into_record(record_id, existing.farm);
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_record(&self, scope: Scope, record_id: u64) -> Result<()> {
        self.check_error("delete_record", scope, Some(record_id), None)
            .await?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(ApiError::NotFound(format!("Crop stage {}", record_id)).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::{CropRecordBuilder, draft};

    #[tokio::test]
    async fn test_list_filters_by_farm() {
        let mock = MockFarmClient::new()
            .with_records(vec![
                CropRecordBuilder::new(1).farm(1).build(),
                CropRecordBuilder::new(2).farm(2).build(),
            ])
            .await;

        let all = mock.list_records(Scope::All, ListFlags::default()).await.unwrap();
        let farm2 = mock
            .list_records(Scope::Farm(2), ListFlags::default())
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(farm2.len(), 1);
        assert_eq!(farm2[0].id, 2);
        assert_eq!(mock.call_counts().await.list_records, 2);
    }

    #[tokio::test]
    async fn test_errors_consumed_in_order() {
        let mock = MockFarmClient::new()
            .with_errors(1, || ApiError::Network("down".into()))
            .await;

        assert!(mock.list_records(Scope::All, ListFlags::default()).await.is_err());
        assert!(mock.list_records(Scope::All, ListFlags::default()).await.is_ok());

        let captured = mock.captured_requests().await;
        assert!(captured[0].failed);
        assert!(!captured[1].failed);
    }

    #[tokio::test]
    async fn test_mutations_change_records() {
        let mock = MockFarmClient::new()
            .with_records(vec![CropRecordBuilder::new(5).build()])
            .await;

        let created = mock.create_record(Scope::Farm(1), &draft("NEW-1")).await.unwrap();
        assert_eq!(created.batch_code, "NEW-1");

        let updated = mock.update_record(Scope::All, 5, &draft("B-5b")).await.unwrap();
        assert_eq!(updated.batch_code, "B-5b");

        mock.delete_record(Scope::All, 5).await.unwrap();
        assert!(mock.delete_record(Scope::All, 5).await.is_err());

        let records = mock.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, created.id);
        assert_eq!(mock.call_counts().await.mutations(), 4);
    }
}
