//! Display models for analytics sections

use serde::Serialize;
use tabled::Tabled;

use crate::insights::{HarvestWindow, OverdueStage};

/// Upcoming harvest row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct HarvestDisplay {
    #[tabled(rename = "RECORD")]
    pub record_id: u64,

    #[tabled(rename = "BATCH")]
    pub label: String,

    #[tabled(rename = "HARVEST DATE")]
    pub date: String,

    #[tabled(rename = "IN")]
    pub days_until: String,
}

impl From<&HarvestWindow> for HarvestDisplay {
    fn from(window: &HarvestWindow) -> Self {
        Self {
            record_id: window.record_id,
            label: window.label.clone(),
            date: window.expected_harvest_date.format("%Y-%m-%d").to_string(),
            days_until: match window.days_until {
                0 => "today".to_string(),
                1 => "1 day".to_string(),
                n => format!("{} days", n),
            },
        }
    }
}

/// Overdue stage row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct OverdueDisplay {
    #[tabled(rename = "RECORD")]
    pub record_id: u64,

    #[tabled(rename = "BATCH")]
    pub label: String,

    #[tabled(rename = "STAGE")]
    pub stage: String,

    #[tabled(rename = "ENDED")]
    pub stage_end_date: String,

    #[tabled(rename = "OVERDUE")]
    pub days_overdue: String,
}

impl From<&OverdueStage> for OverdueDisplay {
    fn from(overdue: &OverdueStage) -> Self {
        Self {
            record_id: overdue.record_id,
            label: overdue.label.clone(),
            stage: overdue.stage.to_string(),
            stage_end_date: overdue.stage_end_date.format("%Y-%m-%d").to_string(),
            days_overdue: format!("{}d", overdue.days_overdue),
        }
    }
}
