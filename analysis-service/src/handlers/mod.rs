//! HTTP handlers for the analysis service.

pub mod analyze;
pub mod health;

pub use analyze::analyze_image;
pub use health::health_check;
