//! Time-sensitive alerts derived from crop records

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{CropRecord, HealthStatus};

/// Days before the expected harvest date at which a batch is ready.
pub const HARVEST_READY_DAYS: i64 = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StageTransition,
    HarvestReady,
    HarvestOverdue,
    HealthCritical,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::StageTransition => "stage_transition",
            AlertKind::HarvestReady => "harvest_ready",
            AlertKind::HarvestOverdue => "harvest_overdue",
            AlertKind::HealthCritical => "health_critical",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert urgency, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
            AlertPriority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A condition on one record that needs attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// `kind:record_id`; stable across evaluations while the condition holds
    pub id: String,
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub record_id: u64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    fn new(
        kind: AlertKind,
        priority: AlertPriority,
        record: &CropRecord,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: alert_id(kind, record.id),
            kind,
            priority,
            record_id: record.id,
            message,
            timestamp: now,
        }
    }
}

pub fn alert_id(kind: AlertKind, record_id: u64) -> String {
    format!("{}:{}", kind.as_str(), record_id)
}

/// Evaluate every alert rule against `records` as of `now`.
///
/// The result is ordered by priority (critical first), then record id.
pub fn evaluate(records: &[CropRecord], now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = records
        .iter()
        .flat_map(|record| {
            [
                stage_transition(record, now),
                harvest_window(record, now),
                health_risk(record, now),
            ]
        })
        .flatten()
        .collect();

    alerts.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.record_id.cmp(&b.record_id))
            .then(a.kind.cmp(&b.kind))
    });
    alerts
}

fn stage_transition(record: &CropRecord, now: DateTime<Utc>) -> Option<Alert> {
    let stage = record.current_stage;
    let next = stage.next()?;
    let days = record.days_since_transplant(now.date_naive());
    if days < stage.cumulative_days() {
        return None;
    }

    Some(Alert::new(
        AlertKind::StageTransition,
        AlertPriority::Medium,
        record,
        format!(
            "{} is due to move from {} to {} ({} days since transplant)",
            record.label(),
            stage,
            next,
            days
        ),
        now,
    ))
}

fn harvest_window(record: &CropRecord, now: DateTime<Utc>) -> Option<Alert> {
    if record.is_harvested() {
        return None;
    }
    let days = record.days_to_harvest(now.date_naive())?;

    let (kind, priority, message) = match days {
        d if d < 0 => (
            AlertKind::HarvestOverdue,
            AlertPriority::Critical,
            format!("{} harvest is overdue by {} day(s)", record.label(), -d),
        ),
        0 => (
            AlertKind::HarvestReady,
            AlertPriority::High,
            format!("{} is ready for harvest today", record.label()),
        ),
        d if d <= HARVEST_READY_DAYS => (
            AlertKind::HarvestReady,
            AlertPriority::High,
            format!("{} is ready for harvest in {} day(s)", record.label(), d),
        ),
        _ => return None,
    };
    Some(Alert::new(kind, priority, record, message, now))
}

fn health_risk(record: &CropRecord, now: DateTime<Utc>) -> Option<Alert> {
    let priority = match record.health_status {
        HealthStatus::Critical => AlertPriority::Critical,
        HealthStatus::Poor | HealthStatus::NeedsAttention => AlertPriority::High,
        _ => return None,
    };

    let mut message = format!("{} health is {}", record.label(), record.health_status);
    if let Some(issues) = &record.issues_reported {
        message.push_str(": ");
        message.push_str(issues);
    }
    Some(Alert::new(
        AlertKind::HealthCritical,
        priority,
        record,
        message,
        now,
    ))
}

/// Alert ids the user has dismissed.
///
/// Held by the caller; evaluation never consults it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissedAlerts {
    ids: HashSet<String>,
}

impl DismissedAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already dismissed.
    pub fn dismiss(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Bulk clear: dismiss every alert in `alerts`.
    pub fn dismiss_all(&mut self, alerts: &[Alert]) {
        self.ids.extend(alerts.iter().map(|a| a.id.clone()));
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Drop dismissed alerts, keeping order.
    pub fn visible(&self, alerts: Vec<Alert>) -> Vec<Alert> {
        alerts
            .into_iter()
            .filter(|a| !self.is_dismissed(&a.id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DismissedAlerts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
