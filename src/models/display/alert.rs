//! Alert display model

use serde::Serialize;
use tabled::Tabled;

use crate::insights::Alert;

/// Alert display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct AlertDisplay {
    /// Id to pass to `--dismiss`
    #[tabled(rename = "ID")]
    pub id: String,

    #[tabled(rename = "PRIORITY")]
    pub priority: String,

    #[tabled(rename = "RECORD")]
    pub record_id: u64,

    #[tabled(rename = "MESSAGE")]
    pub message: String,
}

impl From<Alert> for AlertDisplay {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            priority: alert.priority.to_string(),
            record_id: alert.record_id,
            message: alert.message,
        }
    }
}
