//! Farm API data models
//!
//! Domain types exchanged with the crop stage endpoints of the farm API.

mod crop;
mod scope;
mod serde_helpers;

// Re-export all models for convenient access
pub use crop::{CropRecord, CropRecordDraft, CropStage, HealthStatus};
pub use scope::{ListFlags, Scope};
