//! Typed view of the analysis the model is asked to produce.
//!
//! The relay never validates against this shape; it exists for callers that
//! want to summarise a result (the CLI) and tolerates missing sections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub quality_assessment: Option<QualityAssessment>,
    #[serde(default)]
    pub optimizations: Vec<String>,
    #[serde(default)]
    pub safety_check: Option<SafetyCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub estimated_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub rating: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyCheck {
    #[serde(default)]
    pub bias_detected: bool,
    #[serde(default)]
    pub privacy_concern: bool,
}

impl InventoryReport {
    /// `None` when the value does not fit the expected shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn total_estimated_count(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.estimated_count))
    }

    pub fn summary(&self) -> String {
        let rating = self
            .quality_assessment
            .as_ref()
            .map(|q| q.rating.as_str())
            .unwrap_or("unrated");

        let mut summary = format!(
            "{} item types, ~{} units, quality: {}",
            self.items.len(),
            self.total_estimated_count(),
            rating
        );

        if self.safety_check.is_some_and(|s| s.privacy_concern) {
            summary.push_str(" [privacy concern]");
        }
        summary
    }
}
