//! Comps Valuation - comparable-sales property valuation engine
//!
//! This library estimates the market value of a subject property from nearby listings.
//! Listings are filtered into comparables, scored on six independent criteria in
//! parallel, and their prices averaged using those scores as weights.

pub mod config;
pub mod core;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use crate::core::{compute_valuation, ComparableFilter, Criterion, Valuation};
pub use error::{AppError, ScoringError};
pub use models::{Property, PropertyStatus, ValuationConfig, ValuationReport};
