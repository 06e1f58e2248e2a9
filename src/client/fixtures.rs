//! Test fixtures and builders for API model types
//!
//! Provides builder patterns for creating test data with sensible defaults.
//! Import via `use crate::client::fixtures::*` in test modules.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};

use super::models::{CropRecord, CropRecordDraft, CropStage, HealthStatus};

/// Fixed reference day used by most fixtures
pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// CropRecordBuilder
// ============================================================================

/// Builder for creating test CropRecord instances.
///
/// # Example
/// ```ignore
/// let record = CropRecordBuilder::new(7)
///     .stage(CropStage::Flowering)
///     .health(HealthStatus::Poor)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CropRecordBuilder {
    record: CropRecord,
}

impl CropRecordBuilder {
    /// Create a new builder: a healthy germinating tomato batch on farm 1,
    /// transplanted on 2025-03-01.
    pub fn new(id: u64) -> Self {
        Self {
            record: CropRecord {
                id,
                farm: 1,
                farm_name: None,
                crop_name: "Tomato".to_string(),
                variety: "Roma".to_string(),
                batch_code: format!("B-{}", id),
                farm_section: None,
                area: None,
                number_of_plants: None,
                current_stage: CropStage::Germination,
                stage_start_date: None,
                stage_end_date: None,
                sowing_date: None,
                transplant_date: day("2025-03-01"),
                expected_harvest_date: None,
                actual_harvest_date: None,
                health_status: HealthStatus::Healthy,
                issues_reported: None,
                notes: None,
                expected_yield: None,
                actual_yield: None,
                losses: None,
                growth_duration_days: None,
                created_at: None,
                updated_at: None,
            },
        }
    }

    pub fn farm(mut self, farm: u64) -> Self {
        self.record.farm = farm;
        self
    }

    pub fn crop(mut self, name: impl Into<String>) -> Self {
        self.record.crop_name = name.into();
        self
    }

    pub fn stage(mut self, stage: CropStage) -> Self {
        self.record.current_stage = stage;
        self
    }

    pub fn health(mut self, health: HealthStatus) -> Self {
        self.record.health_status = health;
        self
    }

    pub fn transplanted(mut self, date: NaiveDate) -> Self {
        self.record.transplant_date = date;
        self
    }

    /// Transplanted `days` before `today`.
    pub fn transplanted_days_ago(mut self, today: NaiveDate, days: i64) -> Self {
        self.record.transplant_date = today - Duration::days(days);
        self
    }

    pub fn stage_end(mut self, date: NaiveDate) -> Self {
        self.record.stage_end_date = Some(date);
        self
    }

    pub fn expected_harvest(mut self, date: NaiveDate) -> Self {
        self.record.expected_harvest_date = Some(date);
        self
    }

    pub fn harvested(mut self, date: NaiveDate) -> Self {
        self.record.actual_harvest_date = Some(date);
        self
    }

    pub fn yields(mut self, expected: Option<f64>, actual: Option<f64>) -> Self {
        self.record.expected_yield = expected;
        self.record.actual_yield = actual;
        self
    }

    pub fn growth_days(mut self, days: i64) -> Self {
        self.record.growth_duration_days = Some(days);
        self
    }

    pub fn build(self) -> CropRecord {
        self.record
    }
}

/// Minimal valid draft for mutation tests.
pub fn draft(batch_code: &str) -> CropRecordDraft {
    CropRecordDraft {
        farm: None,
        crop_name: "Tomato".to_string(),
        variety: "Roma".to_string(),
        batch_code: batch_code.to_string(),
        farm_section: None,
        area: None,
        number_of_plants: None,
        current_stage: CropStage::Germination,
        stage_start_date: None,
        stage_end_date: None,
        sowing_date: None,
        transplant_date: day("2025-03-01"),
        expected_harvest_date: None,
        actual_harvest_date: None,
        health_status: HealthStatus::Healthy,
        issues_reported: None,
        notes: None,
        expected_yield: None,
        actual_yield: None,
        losses: None,
    }
}
