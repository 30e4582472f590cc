use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one valuation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    #[serde(rename = "runId")]
    pub run_id: Uuid,
    #[serde(rename = "estimatedValue")]
    pub estimated_value: f64,
    #[serde(rename = "totalWeight")]
    pub total_weight: f64,
    /// Listings handed to the filter
    pub candidates: usize,
    /// Comparables that contributed, in filter order
    pub comparables: Vec<ScoredComparable>,
    /// Comparables dropped because scoring failed
    pub skipped: usize,
}

/// One comparable's contribution to the estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComparable {
    pub id: String,
    pub price: f64,
    pub weight: f64,
}
