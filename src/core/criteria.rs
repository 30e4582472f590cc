use chrono::{DateTime, Utc};

use crate::core::filters::{NINE_MONTHS, SIX_MONTHS, THREE_MONTHS};
use crate::error::ScoringError;
use crate::models::{Property, PropertyStatus, StatusScores, TimeScores, ValuationConfig};

/// Score for a style mismatch
pub const STYLE_MISMATCH_SCORE: f64 = 0.2;
/// Score for listings older than the last recency bucket
pub const RECENCY_FLOOR: f64 = 0.1;
/// Score for sizes further apart than the last size bucket
pub const SIZE_FLOOR: f64 = 0.1;

/// Size buckets as (max relative difference, score), checked in order
const SIZE_BUCKETS: [(f64, f64); 4] = [(0.05, 1.0), (0.10, 0.8), (0.20, 0.5), (0.30, 0.2)];

/// One independent dimension of similarity between a comparable and the subject
///
/// Each variant carries its weight and any lookup table it needs.
/// `evaluate` returns the raw score in [0, 1] multiplied by that weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    PropertyType { weight: f64 },
    Bedrooms { weight: f64 },
    Bathrooms { weight: f64 },
    Size { weight: f64 },
    Recency { weight: f64, scores: TimeScores, now: DateTime<Utc> },
    Status { weight: f64, scores: StatusScores },
}

impl Criterion {
    /// Build the ordered criterion list for one valuation
    pub fn from_config(config: &ValuationConfig, now: DateTime<Utc>) -> Vec<Criterion> {
        let weights = &config.criteria_weights;
        vec![
            Criterion::PropertyType { weight: weights.property_type },
            Criterion::Bedrooms { weight: weights.bedrooms },
            Criterion::Bathrooms { weight: weights.bathrooms },
            Criterion::Size { weight: weights.size },
            Criterion::Recency { weight: weights.recency, scores: config.time_scores, now },
            Criterion::Status { weight: weights.status, scores: config.status_scores },
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Criterion::PropertyType { .. } => "property_type",
            Criterion::Bedrooms { .. } => "bedrooms",
            Criterion::Bathrooms { .. } => "bathrooms",
            Criterion::Size { .. } => "size",
            Criterion::Recency { .. } => "recency",
            Criterion::Status { .. } => "status",
        }
    }

    pub fn weight(&self) -> f64 {
        match *self {
            Criterion::PropertyType { weight }
            | Criterion::Bedrooms { weight }
            | Criterion::Bathrooms { weight }
            | Criterion::Size { weight }
            | Criterion::Recency { weight, .. }
            | Criterion::Status { weight, .. } => weight,
        }
    }

    /// Unweighted similarity score (0-1)
    ///
    /// Recency fails when the comparable's timestamp cannot be aged against `now`.
    pub fn score(&self, comparable: &Property, subject: &Property) -> Result<f64, ScoringError> {
        let score = match self {
            Criterion::PropertyType { .. } => property_type_score(&comparable.style, &subject.style),
            Criterion::Bedrooms { .. } => bedroom_score(comparable.beds.abs_diff(subject.beds)),
            Criterion::Bathrooms { .. } => {
                bathroom_score(comparable.baths.total - subject.baths.total)
            }
            Criterion::Size { .. } => {
                size_score((comparable.size - subject.size).abs() / subject.size)
            }
            Criterion::Recency { scores, now, .. } => {
                let age = comparable.age_in_months(*now).ok_or_else(|| {
                    ScoringError::InvalidTimestamp {
                        id: comparable.id.clone(),
                        timestamp: comparable.effective_timestamp(),
                    }
                })?;
                recency_score(age, scores)
            }
            Criterion::Status { scores, .. } => status_score(&comparable.status, scores),
        };
        Ok(score)
    }

    /// Weighted score; fails when the result is not a finite number
    pub fn evaluate(&self, comparable: &Property, subject: &Property) -> Result<f64, ScoringError> {
        let value = self.score(comparable, subject)? * self.weight();
        if !value.is_finite() {
            return Err(ScoringError::NonFiniteScore {
                criterion: self.name(),
                value,
            });
        }
        Ok(value)
    }
}

/// 1.0 for identical style labels, a flat penalty otherwise
#[inline]
pub fn property_type_score(style: &str, subject_style: &str) -> f64 {
    if style == subject_style {
        1.0
    } else {
        STYLE_MISMATCH_SCORE
    }
}

/// Inverse-linear decay in the bedroom difference
#[inline]
pub fn bedroom_score(diff: u32) -> f64 {
    1.0 / (1.0 + diff as f64)
}

/// Inverse-linear decay in the (fractional) bathroom difference
#[inline]
pub fn bathroom_score(diff: f64) -> f64 {
    1.0 / (1.0 + diff.abs())
}

/// Step function of the relative size difference; bucket bounds are inclusive
///
/// A non-finite ratio counts as maximally dissimilar.
#[inline]
pub fn size_score(ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return SIZE_FLOOR;
    }

    SIZE_BUCKETS
        .iter()
        .find(|(max_ratio, _)| ratio <= *max_ratio)
        .map(|(_, score)| *score)
        .unwrap_or(SIZE_FLOOR)
}

#[inline]
pub fn recency_score(age_in_months: f64, scores: &TimeScores) -> f64 {
    if age_in_months <= THREE_MONTHS {
        scores.three_months
    } else if age_in_months <= SIX_MONTHS {
        scores.six_months
    } else if age_in_months <= NINE_MONTHS {
        scores.nine_months
    } else {
        RECENCY_FLOOR
    }
}

/// Unknown statuses fall into the active bucket
#[inline]
pub fn status_score(status: &PropertyStatus, scores: &StatusScores) -> f64 {
    match status {
        PropertyStatus::Closed => scores.sold,
        PropertyStatus::UnderContract => scores.pending,
        PropertyStatus::Active | PropertyStatus::Other(_) => scores.active,
    }
}
