//! Display model implementations for table and JSON output
//!
//! Display models transform API response types into CLI-friendly formats
//! with appropriate column names and serialization.

mod alert;
mod analytics;
mod common;
mod pending;
mod record;

pub use alert::AlertDisplay;
pub use analytics::{HarvestDisplay, OverdueDisplay};
pub use pending::PendingDisplay;
pub use record::RecordDisplay;
