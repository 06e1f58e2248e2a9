//! Crop stage record display model

use serde::Serialize;
use tabled::Tabled;

use super::common::{format_amount, format_date, truncate_string};
use crate::client::CropRecord;

/// Crop stage record display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct RecordDisplay {
    #[tabled(rename = "ID")]
    pub id: u64,

    #[tabled(rename = "FARM")]
    pub farm: u64,

    /// Crop and variety, e.g. `Tomato (Roma)`
    #[tabled(rename = "CROP")]
    pub crop: String,

    #[tabled(rename = "BATCH")]
    pub batch_code: String,

    #[tabled(rename = "STAGE")]
    pub stage: String,

    #[tabled(rename = "HEALTH")]
    pub health: String,

    #[tabled(rename = "TRANSPLANTED")]
    pub transplanted: String,

    #[tabled(rename = "HARVEST")]
    pub expected_harvest: String,

    #[tabled(rename = "YIELD")]
    pub yield_summary: String,

    #[tabled(rename = "ISSUES")]
    pub issues: String,
}

impl From<&CropRecord> for RecordDisplay {
    fn from(record: &CropRecord) -> Self {
        Self {
            id: record.id,
            farm: record.farm,
            crop: format!("{} ({})", record.crop_name, record.variety),
            batch_code: record.batch_code.clone(),
            stage: record.current_stage.to_string(),
            health: record.health_status.to_string(),
            transplanted: record.transplant_date.format("%Y-%m-%d").to_string(),
            expected_harvest: format_date(record.expected_harvest_date),
            yield_summary: format!(
                "{} / {}",
                format_amount(record.actual_yield),
                format_amount(record.expected_yield)
            ),
            issues: record
                .issues_reported
                .as_deref()
                .map(|s| truncate_string(s, 30))
                .unwrap_or_default(),
        }
    }
}

impl From<CropRecord> for RecordDisplay {
    fn from(record: CropRecord) -> Self {
        Self::from(&record)
    }
}
