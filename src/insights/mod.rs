//! Derived views over a crop record set
//!
//! Both passes are pure functions of the records and the evaluation time;
//! they never touch the cache or the network.

pub mod alerts;
pub mod analytics;

pub use alerts::{Alert, DismissedAlerts, evaluate};
pub use analytics::{AnalyticsSnapshot, DataQuality, HarvestWindow, OverdueStage, aggregate};
