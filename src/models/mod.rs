// Model exports
pub mod domain;
pub mod responses;

pub use domain::{
    Address, Bathroom, ComparableScore, CriteriaWeights, Property, PropertyStatus, StatusScores,
    TimeScores, ValuationConfig, SECONDS_PER_MONTH,
};
pub use responses::{ScoredComparable, ValuationReport};
