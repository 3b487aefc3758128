pub mod providers;
pub mod relay;

pub use relay::{AnalysisError, AnalysisRelay};
