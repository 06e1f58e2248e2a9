//! Crop stage records and mutation payloads

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{blank_as_none, decimal_opt};

/// Growth stage of a crop batch, in lifecycle order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CropStage {
    #[default]
    Germination,
    Seedling,
    Vegetative,
    Flowering,
    Fruiting,
    Harvest,
}

impl CropStage {
    pub const ALL: [CropStage; 6] = [
        CropStage::Germination,
        CropStage::Seedling,
        CropStage::Vegetative,
        CropStage::Flowering,
        CropStage::Fruiting,
        CropStage::Harvest,
    ];

    /// Nominal number of days a batch spends in this stage.
    pub fn nominal_days(self) -> i64 {
        match self {
            CropStage::Germination => 7,
            CropStage::Seedling => 14,
            CropStage::Vegetative => 28,
            CropStage::Flowering => 21,
            CropStage::Fruiting => 35,
            CropStage::Harvest => 7,
        }
    }

    /// Nominal days from transplant to the end of this stage.
    pub fn cumulative_days(self) -> i64 {
        CropStage::ALL
            .iter()
            .take_while(|stage| **stage <= self)
            .map(|stage| stage.nominal_days())
            .sum()
    }

    pub fn next(self) -> Option<CropStage> {
        let idx = CropStage::ALL.iter().position(|stage| *stage == self)?;
        CropStage::ALL.get(idx + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == CropStage::Harvest
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CropStage::Germination => "germination",
            CropStage::Seedling => "seedling",
            CropStage::Vegetative => "vegetative",
            CropStage::Flowering => "flowering",
            CropStage::Fruiting => "fruiting",
            CropStage::Harvest => "harvest",
        }
    }
}

impl fmt::Display for CropStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed health of a crop batch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    #[default]
    Healthy,
    Moderate,
    NeedsAttention,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Moderate => "moderate",
            HealthStatus::NeedsAttention => "needs_attention",
            HealthStatus::Poor => "poor",
            HealthStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crop stage record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    /// Record ID
    pub id: u64,

    /// Owning farm ID
    pub farm: u64,

    /// Farm name (read-only projection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,

    pub crop_name: String,
    pub variety: String,
    pub batch_code: String,

    /// Farm section or hydroponic unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_section: Option<String>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub area: Option<f64>,

    #[serde(default)]
    pub number_of_plants: Option<u32>,

    pub current_stage: CropStage,

    #[serde(default)]
    pub stage_start_date: Option<NaiveDate>,

    /// When the current stage ended or is expected to end
    #[serde(default)]
    pub stage_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub sowing_date: Option<NaiveDate>,

    pub transplant_date: NaiveDate,

    #[serde(default)]
    pub expected_harvest_date: Option<NaiveDate>,

    #[serde(default)]
    pub actual_harvest_date: Option<NaiveDate>,

    #[serde(default)]
    pub health_status: HealthStatus,

    /// Pests, diseases, nutrient deficiency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_reported: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub expected_yield: Option<f64>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub actual_yield: Option<f64>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub losses: Option<f64>,

    /// Days since transplant, computed by the API
    #[serde(default)]
    pub growth_duration_days: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CropRecord {
    pub fn days_since_transplant(&self, today: NaiveDate) -> i64 {
        (today - self.transplant_date).num_days()
    }

    /// Signed days until the expected harvest; negative once it has passed.
    pub fn days_to_harvest(&self, today: NaiveDate) -> Option<i64> {
        self.expected_harvest_date
            .map(|date| (date - today).num_days())
    }

    pub fn is_harvested(&self) -> bool {
        self.actual_harvest_date.is_some()
    }

    /// Actual over expected yield, as a percentage.
    pub fn yield_efficiency(&self) -> Option<f64> {
        match (self.expected_yield, self.actual_yield) {
            (Some(expected), Some(actual)) if expected > 0.0 => Some(100.0 * actual / expected),
            _ => None,
        }
    }

    /// Short human label, e.g. `Tomato (Roma) B-12`.
    pub fn label(&self) -> String {
        format!("{} ({}) {}", self.crop_name, self.variety, self.batch_code)
    }
}

/// Payload for creating or updating a crop stage record.
///
/// Missing stage and health default to `germination` and `healthy`; blank
/// optional text is treated as absent. Unset optional fields are sent as
/// `null`, which clears them on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecordDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm: Option<u64>,

    pub crop_name: String,
    pub variety: String,
    pub batch_code: String,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub farm_section: Option<String>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub area: Option<f64>,

    #[serde(default)]
    pub number_of_plants: Option<u32>,

    #[serde(default)]
    pub current_stage: CropStage,

    #[serde(default)]
    pub stage_start_date: Option<NaiveDate>,

    #[serde(default)]
    pub stage_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub sowing_date: Option<NaiveDate>,

    pub transplant_date: NaiveDate,

    #[serde(default)]
    pub expected_harvest_date: Option<NaiveDate>,

    #[serde(default)]
    pub actual_harvest_date: Option<NaiveDate>,

    #[serde(default)]
    pub health_status: HealthStatus,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub issues_reported: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub expected_yield: Option<f64>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub actual_yield: Option<f64>,

    #[serde(default, deserialize_with = "decimal_opt")]
    pub losses: Option<f64>,
}

impl CropRecordDraft {
    /// Build the record the API would return for this draft.
    pub fn into_record(self, id: u64, farm: u64) -> CropRecord {
        CropRecord {
            id,
            farm: self.farm.unwrap_or(farm),
            farm_name: None,
            crop_name: self.crop_name,
            variety: self.variety,
            batch_code: self.batch_code,
            farm_section: self.farm_section,
            area: self.area,
            number_of_plants: self.number_of_plants,
            current_stage: self.current_stage,
            stage_start_date: self.stage_start_date,
            stage_end_date: self.stage_end_date,
            sowing_date: self.sowing_date,
            transplant_date: self.transplant_date,
            expected_harvest_date: self.expected_harvest_date,
            actual_harvest_date: self.actual_harvest_date,
            health_status: self.health_status,
            issues_reported: self.issues_reported,
            notes: self.notes,
            expected_yield: self.expected_yield,
            actual_yield: self.actual_yield,
            losses: self.losses,
            growth_duration_days: None,
            created_at: None,
            updated_at: None,
        }
    }
}
