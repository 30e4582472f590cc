// Core algorithm exports
pub mod criteria;
pub mod filters;
pub mod valuation;

pub use criteria::{
    bathroom_score, bedroom_score, property_type_score, recency_score, size_score, status_score,
    Criterion,
};
pub use filters::{cutoff_age, is_similar_property, ComparableFilter};
pub use valuation::{compute_valuation, score_comparable, weighted_average, Valuation};
