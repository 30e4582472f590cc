use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Length of one "month" when ageing listings: 30 days, in seconds
pub const SECONDS_PER_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Real-estate record, used both for the subject and for market listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub baths: Bathroom,
    #[serde(default)]
    pub beds: u32,
    #[serde(rename = "listPrice", default)]
    pub list_price: f64,
    #[serde(rename = "salePrice", default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub style: String,
    #[serde(rename = "yearBuilt", default)]
    pub year_built: Option<u16>,
    /// Listing time, Unix seconds
    #[serde(rename = "listingDate", default)]
    pub listing_date: i64,
    /// Last status change, Unix seconds (0 when never recorded)
    #[serde(rename = "statusChangeTimestamp", default)]
    pub status_change_timestamp: i64,
    #[serde(rename = "propertyType", default)]
    pub property_type: String,
}

impl Property {
    /// Effective price: the realized sale price when there is one, else the asking price
    pub fn price(&self) -> f64 {
        match self.sale_price {
            Some(sale) if sale > 0.0 => sale,
            _ => self.list_price,
        }
    }

    /// Whether the listing carries any pricing information at all
    pub fn has_price(&self) -> bool {
        self.list_price != 0.0 || self.sale_price.is_some_and(|sale| sale != 0.0)
    }

    /// Timestamp that ages this listing: the status change for closed sales,
    /// the listing date otherwise
    pub fn effective_timestamp(&self) -> i64 {
        if self.status == PropertyStatus::Closed {
            self.status_change_timestamp
        } else {
            self.listing_date
        }
    }

    /// Age in 30-day months relative to `now`
    ///
    /// `None` when the effective timestamp is too far from `now` to subtract.
    pub fn age_in_months(&self, now: DateTime<Utc>) -> Option<f64> {
        now.timestamp()
            .checked_sub(self.effective_timestamp())
            .map(|seconds| seconds as f64 / SECONDS_PER_MONTH)
    }

    /// Closed sale with a recorded closing time
    pub fn is_recorded_sale(&self) -> bool {
        self.status == PropertyStatus::Closed && self.status_change_timestamp > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub street: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bathroom {
    /// Full baths count 1.0, half baths 0.5
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub full: u32,
    #[serde(default)]
    pub half: u32,
}

/// Listing lifecycle status
///
/// Unrecognized wire values are preserved in `Other` and score like active listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyStatus {
    Active,
    UnderContract,
    Closed,
    Other(String),
}

impl Default for PropertyStatus {
    fn default() -> Self {
        PropertyStatus::Other(String::new())
    }
}

impl From<String> for PropertyStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Active" => PropertyStatus::Active,
            "Under Contract" | "Pending" => PropertyStatus::UnderContract,
            "Closed" | "Sold" => PropertyStatus::Closed,
            _ => PropertyStatus::Other(value),
        }
    }
}

impl From<&str> for PropertyStatus {
    fn from(value: &str) -> Self {
        PropertyStatus::from(value.to_string())
    }
}

impl From<PropertyStatus> for String {
    fn from(status: PropertyStatus) -> Self {
        match status {
            PropertyStatus::Active => "Active".to_string(),
            PropertyStatus::UnderContract => "Under Contract".to_string(),
            PropertyStatus::Closed => "Closed".to_string(),
            PropertyStatus::Other(raw) => raw,
        }
    }
}

/// Per-criterion weights; by convention they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct CriteriaWeights {
    #[validate(range(min = 0.0, max = 1.0))]
    pub property_type: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub bedrooms: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub bathrooms: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub size: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub recency: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub status: f64,
}

impl CriteriaWeights {
    pub fn total(&self) -> f64 {
        self.property_type + self.bedrooms + self.bathrooms + self.size + self.recency + self.status
    }
}

/// Recency multipliers by age bucket; anything older than nine months gets a fixed floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct TimeScores {
    #[validate(range(min = 0.0, max = 1.0))]
    pub three_months: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub six_months: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub nine_months: f64,
}

/// Status multipliers by listing status category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct StatusScores {
    #[validate(range(min = 0.0, max = 1.0))]
    pub sold: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub pending: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub active: f64,
}

impl StatusScores {
    /// Sold >= pending >= active
    pub fn is_monotonic(&self) -> bool {
        self.sold >= self.pending && self.pending >= self.active
    }
}

/// Weights, score tables and thresholds driving one valuation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ValuationConfig {
    #[validate(nested)]
    pub criteria_weights: CriteriaWeights,
    #[validate(nested)]
    pub time_scores: TimeScores,
    #[validate(nested)]
    pub status_scores: StatusScores,
    /// Closed sales needed in a recency window before the filter stops widening it
    #[validate(range(min = 1))]
    pub min_sales_count: u32,
}

/// Price and total criterion weight of one scored comparable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparableScore {
    pub price: f64,
    pub weight: f64,
}

impl ComparableScore {
    pub fn weighted_price(&self) -> f64 {
        self.price * self.weight
    }
}
