//! Display models for CLI output
//!
//! This module converts API records and derived insights into CLI-friendly
//! display rows.

pub mod display;

pub use display::{AlertDisplay, HarvestDisplay, OverdueDisplay, PendingDisplay, RecordDisplay};
