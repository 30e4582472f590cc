use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::core::{criteria::Criterion, filters::ComparableFilter};
use crate::error::ScoringError;
use crate::models::{ComparableScore, Property, ScoredComparable, ValuationConfig, ValuationReport};

/// Valuation engine for one subject property
///
/// # Pipeline Stages
/// 1. Comparable filtering and recency ordering
/// 2. Per-comparable scoring, one task per comparable
/// 3. Weighted average of comparable prices
///
/// The subject and configuration are shared read-only with every scorer task.
/// Each call re-filters and re-scores from scratch.
#[derive(Debug, Clone)]
pub struct Valuation {
    subject: Arc<Property>,
    config: ValuationConfig,
    filter: ComparableFilter,
    now: DateTime<Utc>,
}

impl Valuation {
    pub fn new(subject: Property, config: ValuationConfig) -> Self {
        Self::with_clock(subject, config, Utc::now())
    }

    /// Valuation that ages listings relative to a fixed `now`
    pub fn with_clock(subject: Property, config: ValuationConfig, now: DateTime<Utc>) -> Self {
        Self {
            subject: Arc::new(subject),
            filter: ComparableFilter::new(config.min_sales_count),
            config,
            now,
        }
    }

    /// Comparables the estimate would be built from, in priority order
    pub fn comparables(&self, listings: &[Property]) -> Vec<Property> {
        self.filter.filter(&self.subject, listings, self.now)
    }

    /// Estimated value of the subject, 0.0 when no comparable carries weight
    pub async fn calculate(&self, listings: &[Property]) -> f64 {
        self.appraise(listings).await.estimated_value
    }

    /// Run the full valuation and report every comparable's contribution
    pub async fn appraise(&self, listings: &[Property]) -> ValuationReport {
        let run_id = Uuid::new_v4();

        if !(self.subject.size > 0.0) {
            tracing::warn!(
                "Valuation {}: subject {} has non-positive size {}, no listing can qualify",
                run_id,
                self.subject.id,
                self.subject.size
            );
        }

        let comparables = self.comparables(listings);
        let count = comparables.len();
        let criteria: Arc<[Criterion]> = Criterion::from_config(&self.config, self.now).into();

        let mut tasks = JoinSet::new();
        for (index, comparable) in comparables.into_iter().enumerate() {
            let subject = Arc::clone(&self.subject);
            let criteria = Arc::clone(&criteria);
            tasks.spawn(async move {
                let result = score_comparable(&comparable, &subject, &criteria);
                (index, comparable.id, result)
            });
        }

        let (scores, skipped) = collect_scores(tasks, count, run_id).await;

        let (weighted_sum, total_weight) = scores.iter().fold((0.0, 0.0), |(sum, total), (_, score)| {
            (sum + score.weighted_price(), total + score.weight)
        });

        let scored: Vec<ScoredComparable> = scores
            .into_iter()
            .map(|(id, score)| ScoredComparable { id, price: score.price, weight: score.weight })
            .collect();

        let estimated_value = weighted_average(weighted_sum, total_weight);

        tracing::debug!(
            "Valuation {}: {} candidates, {} comparables, {} skipped, total weight {:.4}, estimate {:.2}",
            run_id,
            listings.len(),
            scored.len(),
            skipped,
            total_weight,
            estimated_value
        );

        ValuationReport {
            run_id,
            estimated_value,
            total_weight,
            candidates: listings.len(),
            comparables: scored,
            skipped,
        }
    }
}

type ScorerOutput = (usize, String, Result<ComparableScore, ScoringError>);

/// Drain the scorer tasks into filter order
///
/// Returns the successful scores by index and the number of comparables skipped,
/// either for a scoring error or because the task itself failed.
async fn collect_scores(
    mut tasks: JoinSet<ScorerOutput>,
    count: usize,
    run_id: Uuid,
) -> (Vec<(String, ComparableScore)>, usize) {
    // Slots keep the reduction in filter order regardless of completion order
    let mut slots: Vec<Option<(String, ComparableScore)>> = vec![None; count];
    let mut skipped = 0;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, id, Ok(score))) => {
                slots[index] = Some((id, score));
            }
            Ok((_, id, Err(e))) => {
                skipped += 1;
                tracing::warn!("Valuation {}: skipping comparable {}: {}", run_id, id, e);
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!("Valuation {}: scorer task failed: {}", run_id, e);
            }
        }
    }

    (slots.into_iter().flatten().collect(), skipped)
}

/// Score one comparable against the subject
///
/// The weight is the sum of every criterion's weighted score.
pub fn score_comparable(
    comparable: &Property,
    subject: &Property,
    criteria: &[Criterion],
) -> Result<ComparableScore, ScoringError> {
    let price = comparable.price();
    if !price.is_finite() || price < 0.0 {
        return Err(ScoringError::InvalidPrice {
            id: comparable.id.clone(),
            price,
        });
    }

    let weight = criteria
        .iter()
        .map(|criterion| criterion.evaluate(comparable, subject))
        .sum::<Result<f64, ScoringError>>()?;

    Ok(ComparableScore { price, weight })
}

/// `weighted_sum / total_weight`, or 0.0 when there is no weight or the
/// quotient is not a usable price
#[inline]
pub fn weighted_average(weighted_sum: f64, total_weight: f64) -> f64 {
    if total_weight == 0.0 {
        return 0.0;
    }

    let value = weighted_sum / total_weight;
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Estimate the subject's value from `listings`
pub async fn compute_valuation(
    subject: &Property,
    listings: &[Property],
    config: &ValuationConfig,
    now: DateTime<Utc>,
) -> f64 {
    Valuation::with_clock(subject.clone(), *config, now)
        .calculate(listings)
        .await
}
