//! Domain models for the analysis service.

pub mod report;

pub use report::{InventoryItem, InventoryReport, QualityAssessment, SafetyCheck};
