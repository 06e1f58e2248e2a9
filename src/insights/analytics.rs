//! Summary statistics over crop records

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{CropRecord, CropStage};

/// Days ahead (inclusive) that count as an upcoming harvest.
pub const UPCOMING_HARVEST_DAYS: i64 = 7;

/// How much the snapshot can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Good,
    /// No records to aggregate
    Insufficient,
    /// Records could not be fetched and no earlier snapshot exists
    Error,
}

/// A batch expected to be harvested soon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestWindow {
    pub record_id: u64,
    pub label: String,
    pub expected_harvest_date: NaiveDate,
    pub days_until: i64,
}

/// A batch whose current stage should already have ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueStage {
    pub record_id: u64,
    pub label: String,
    pub stage: CropStage,
    pub stage_end_date: NaiveDate,
    pub days_overdue: i64,
}

/// Aggregated view of a record set.
///
/// Distributions are keyed by the wire name of the status or stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_count: usize,
    pub average_growth_days: f64,
    pub health_distribution: BTreeMap<String, usize>,
    pub stage_distribution: BTreeMap<String, usize>,
    pub upcoming_harvests: Vec<HarvestWindow>,
    pub overdue_stages: Vec<OverdueStage>,
    pub yield_efficiency_percent: f64,
    pub computed_at: DateTime<Utc>,
    pub quality: DataQuality,
}

impl AnalyticsSnapshot {
    /// All-zero snapshot used when there is nothing to fall back to.
    pub fn error(now: DateTime<Utc>) -> Self {
        Self {
            total_count: 0,
            average_growth_days: 0.0,
            health_distribution: BTreeMap::new(),
            stage_distribution: BTreeMap::new(),
            upcoming_harvests: Vec::new(),
            overdue_stages: Vec::new(),
            yield_efficiency_percent: 0.0,
            computed_at: now,
            quality: DataQuality::Error,
        }
    }
}

/// Aggregate `records` as of `now`.
pub fn aggregate(records: &[CropRecord], now: DateTime<Utc>) -> AnalyticsSnapshot {
    let today = now.date_naive();

    let mut health_distribution = BTreeMap::new();
    let mut stage_distribution = BTreeMap::new();
    for record in records {
        *health_distribution
            .entry(record.health_status.as_str().to_string())
            .or_insert(0) += 1;
        *stage_distribution
            .entry(record.current_stage.as_str().to_string())
            .or_insert(0) += 1;
    }

    let average_growth_days = mean(
        records
            .iter()
            .filter_map(|r| r.growth_duration_days)
            .map(|days| days as f64),
    );
    let yield_efficiency_percent = mean(records.iter().filter_map(CropRecord::yield_efficiency));

    let mut upcoming_harvests: Vec<_> = records
        .iter()
        .filter(|r| !r.is_harvested())
        .filter_map(|r| {
            let date = r.expected_harvest_date?;
            let days_until = (date - today).num_days();
            (0..=UPCOMING_HARVEST_DAYS)
                .contains(&days_until)
                .then(|| HarvestWindow {
                    record_id: r.id,
                    label: r.label(),
                    expected_harvest_date: date,
                    days_until,
                })
        })
        .collect();
    upcoming_harvests.sort_by_key(|h| (h.expected_harvest_date, h.record_id));

    let mut overdue_stages: Vec<_> = records
        .iter()
        .filter_map(|r| {
            let end = r.stage_end_date?;
            (end < today).then(|| OverdueStage {
                record_id: r.id,
                label: r.label(),
                stage: r.current_stage,
                stage_end_date: end,
                days_overdue: (today - end).num_days(),
            })
        })
        .collect();
    overdue_stages.sort_by_key(|o| (o.stage_end_date, o.record_id));

    AnalyticsSnapshot {
        total_count: records.len(),
        average_growth_days,
        health_distribution,
        stage_distribution,
        upcoming_harvests,
        overdue_stages,
        yield_efficiency_percent,
        computed_at: now,
        quality: if records.is_empty() {
            DataQuality::Insufficient
        } else {
            DataQuality::Good
        },
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
