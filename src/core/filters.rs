use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::models::Property;

/// Largest relative size difference a comparable may have
pub const MAX_SIZE_RATIO: f64 = 0.20;
/// Largest bedroom count difference a comparable may have
pub const MAX_BED_DIFF: u32 = 1;
/// Largest bathroom total difference a comparable may have
pub const MAX_BATH_DIFF: f64 = 0.5;

/// Recency windows, in months, the sold comparables are cut at
pub const THREE_MONTHS: f64 = 3.0;
pub const SIX_MONTHS: f64 = 6.0;
pub const NINE_MONTHS: f64 = 9.0;

/// Check whether a listing is close enough to the subject to be a comparable
///
/// All tests must pass: some price information, same city (exact match),
/// size within 20%, at most one bedroom and half a bathroom apart.
/// A non-finite size ratio (zero-size subject) rejects the listing.
#[inline]
pub fn is_similar_property(listing: &Property, subject: &Property) -> bool {
    if !listing.has_price() {
        return false;
    }

    if listing.address.city != subject.address.city {
        return false;
    }

    let size_ratio = (listing.size - subject.size).abs() / subject.size;
    if !size_ratio.is_finite() || size_ratio > MAX_SIZE_RATIO {
        return false;
    }

    if listing.beds.abs_diff(subject.beds) > MAX_BED_DIFF {
        return false;
    }

    (listing.baths.total - subject.baths.total).abs() <= MAX_BATH_DIFF
}

/// Pick the recency window for sold comparables
///
/// `sales_3m` counts sales at most three months old, `sales_6m` those
/// older than three but at most six months old.
#[inline]
pub fn cutoff_age(sales_3m: usize, sales_6m: usize, min_sales_count: u32) -> f64 {
    let min_sales = min_sales_count as usize;
    if sales_3m >= min_sales {
        THREE_MONTHS
    } else if sales_3m + sales_6m >= min_sales {
        SIX_MONTHS
    } else {
        NINE_MONTHS
    }
}

/// Selects and orders the comparables for a subject
///
/// # Pipeline Stages
/// 1. Similarity predicate over every listing
/// 2. Split into recorded sales and everything else
/// 3. Keep the freshest sales, widening the window until enough are found
/// 4. Append pending/active listings in input order
#[derive(Debug, Clone, Copy)]
pub struct ComparableFilter {
    min_sales_count: u32,
}

impl ComparableFilter {
    pub fn new(min_sales_count: u32) -> Self {
        Self { min_sales_count }
    }

    pub fn min_sales_count(&self) -> u32 {
        self.min_sales_count
    }

    /// Filter `listings` down to the subject's comparables
    ///
    /// Sold comparables come first by ascending age, followed by every other
    /// qualifying listing in input order.
    pub fn filter(
        &self,
        subject: &Property,
        listings: &[Property],
        now: DateTime<Utc>,
    ) -> Vec<Property> {
        let (sold, others): (Vec<&Property>, Vec<&Property>) = listings
            .iter()
            .filter(|listing| is_similar_property(listing, subject))
            .partition(|listing| listing.is_recorded_sale());

        let mut comparables = self.most_recent_sales(sold, now);
        comparables.extend(others.into_iter().cloned());
        comparables
    }

    fn most_recent_sales(&self, sold: Vec<&Property>, now: DateTime<Utc>) -> Vec<Property> {
        let mut aged: Vec<(f64, &Property)> = sold
            .into_iter()
            .filter_map(|property| match property.age_in_months(now) {
                Some(age) => Some((age, property)),
                None => {
                    tracing::debug!(
                        "Dropping sale {}: timestamp {} out of range",
                        property.id,
                        property.status_change_timestamp
                    );
                    None
                }
            })
            .collect();

        aged.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let sales_3m = aged.iter().filter(|(age, _)| *age <= THREE_MONTHS).count();
        let sales_6m = aged
            .iter()
            .filter(|(age, _)| *age > THREE_MONTHS && *age <= SIX_MONTHS)
            .count();

        let max_age = cutoff_age(sales_3m, sales_6m, self.min_sales_count);

        tracing::debug!(
            "Recorded sales: {} (<=3m: {}, 3-6m: {}), cutoff {} months",
            aged.len(),
            sales_3m,
            sales_6m,
            max_age
        );

        aged.into_iter()
            .filter(|(age, _)| *age <= max_age)
            .map(|(_, property)| property.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Bathroom, PropertyStatus, SECONDS_PER_MONTH};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn months_ago(months: f64) -> i64 {
        now().timestamp() - (months * SECONDS_PER_MONTH) as i64
    }

    #[allow(clippy::too_many_arguments)]
    fn create_test_property(
        id: &str,
        city: &str,
        size: f64,
        beds: u32,
        baths: f64,
        status: &str,
        listing_date: i64,
        status_change: i64,
    ) -> Property {
        Property {
            id: id.to_string(),
            address: Address { city: city.to_string(), ..Default::default() },
            baths: Bathroom { total: baths, ..Default::default() },
            beds,
            list_price: 500_000.0,
            sale_price: Some(600_000.0),
            size,
            status: PropertyStatus::from(status),
            style: "Colonial".to_string(),
            listing_date,
            status_change_timestamp: status_change,
            ..Default::default()
        }
    }

    fn subject() -> Property {
        create_test_property("subject", "Danbury", 2000.0, 4, 2.5, "Active", 0, 0)
    }

    #[test]
    fn test_similar_property_exact_match() {
        let listing = create_test_property("1", "Danbury", 2000.0, 4, 2.5, "Active", 0, 0);
        assert!(is_similar_property(&listing, &subject()));
    }

    #[test]
    fn test_similar_property_rejections() {
        let subject = subject();

        let other_city = create_test_property("1", "Norwalk", 2000.0, 4, 2.5, "Active", 0, 0);
        let lower_case_city = create_test_property("2", "danbury", 2000.0, 4, 2.5, "Active", 0, 0);
        let too_big = create_test_property("3", "Danbury", 3000.0, 4, 2.5, "Active", 0, 0);
        let too_many_beds = create_test_property("4", "Danbury", 2000.0, 6, 2.5, "Active", 0, 0);
        let too_many_baths = create_test_property("5", "Danbury", 2000.0, 4, 4.0, "Active", 0, 0);
        let mut unpriced = create_test_property("6", "Danbury", 2000.0, 4, 2.5, "Active", 0, 0);
        unpriced.list_price = 0.0;
        unpriced.sale_price = None;

        for listing in [other_city, lower_case_city, too_big, too_many_beds, too_many_baths, unpriced] {
            assert!(!is_similar_property(&listing, &subject), "{} should be rejected", listing.id);
        }
    }

    #[test]
    fn test_similar_property_boundaries_inclusive() {
        let subject = subject();

        let size_edge = create_test_property("1", "Danbury", 2400.0, 4, 2.5, "Active", 0, 0);
        let bed_edge = create_test_property("2", "Danbury", 2000.0, 3, 2.5, "Active", 0, 0);
        let bath_edge = create_test_property("3", "Danbury", 2000.0, 4, 3.0, "Active", 0, 0);

        assert!(is_similar_property(&size_edge, &subject));
        assert!(is_similar_property(&bed_edge, &subject));
        assert!(is_similar_property(&bath_edge, &subject));
    }

    #[test]
    fn test_zero_size_subject_rejects_everything() {
        let mut subject = subject();
        subject.size = 0.0;

        let same_size = create_test_property("1", "Danbury", 0.0, 4, 2.5, "Active", 0, 0);
        let sized = create_test_property("2", "Danbury", 2000.0, 4, 2.5, "Active", 0, 0);

        assert!(!is_similar_property(&same_size, &subject));
        assert!(!is_similar_property(&sized, &subject));
    }

    #[test]
    fn test_cutoff_age() {
        assert_eq!(cutoff_age(3, 2, 3), THREE_MONTHS);
        assert_eq!(cutoff_age(2, 2, 3), SIX_MONTHS);
        assert_eq!(cutoff_age(1, 1, 3), NINE_MONTHS);
        assert_eq!(cutoff_age(0, 0, 1), NINE_MONTHS);
    }

    #[test]
    fn test_empty_listings() {
        let filter = ComparableFilter::new(3);
        assert!(filter.filter(&subject(), &[], now()).is_empty());
    }

    #[test]
    fn test_sold_first_by_recency() {
        let filter = ComparableFilter::new(3);
        let listings = vec![
            create_test_property("active", "Danbury", 2000.0, 4, 2.5, "Active", months_ago(2.0), 0),
            create_test_property("closed-1m", "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(7.0), months_ago(1.0)),
            create_test_property("pending", "Danbury", 2000.0, 4, 2.5, "Under Contract", months_ago(4.0), 0),
            create_test_property("closed-2m", "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(4.0), months_ago(2.0)),
        ];

        let ids: Vec<String> = filter
            .filter(&subject(), &listings, now())
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["closed-1m", "closed-2m", "active", "pending"]);
    }

    #[test]
    fn test_closed_without_timestamp_is_secondary() {
        let filter = ComparableFilter::new(1);
        let listings = vec![
            create_test_property("closed-unrecorded", "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(20.0), 0),
            create_test_property("closed", "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(3.0), months_ago(1.0)),
        ];

        let ids: Vec<String> = filter
            .filter(&subject(), &listings, now())
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["closed", "closed-unrecorded"]);
    }

    #[test]
    fn test_sale_with_out_of_range_timestamp_dropped() {
        let filter = ComparableFilter::new(1);
        let pre_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        let closed_at = pre_epoch.timestamp() - SECONDS_PER_MONTH as i64;
        let listings = vec![
            create_test_property("broken", "Danbury", 2000.0, 4, 2.5, "Closed", closed_at, i64::MAX),
            create_test_property("closed", "Danbury", 2000.0, 4, 2.5, "Closed", closed_at, closed_at),
        ];

        let ids: Vec<String> = filter
            .filter(&subject(), &listings, pre_epoch)
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["closed"]);
    }

    #[test]
    fn test_window_stays_narrow_with_enough_recent_sales() {
        let filter = ComparableFilter::new(3);
        let listings: Vec<Property> = [10.0, 7.0, 4.0, 2.0, 1.0, 0.5]
            .iter()
            .enumerate()
            .map(|(i, age)| {
                create_test_property(&i.to_string(), "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(*age), months_ago(*age))
            })
            .collect();

        let kept = filter.filter(&subject(), &listings, now());
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["5", "4", "3"]);
    }

    #[test]
    fn test_window_widens_to_six_months() {
        let filter = ComparableFilter::new(3);
        let listings: Vec<Property> = [10.0, 7.0, 4.0, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, age)| {
                create_test_property(&i.to_string(), "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(*age), months_ago(*age))
            })
            .collect();

        let kept = filter.filter(&subject(), &listings, now());
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["4", "3", "2"]);
    }

    #[test]
    fn test_window_widens_to_nine_months() {
        let filter = ComparableFilter::new(3);
        let listings: Vec<Property> = [10.0, 7.0, 4.0]
            .iter()
            .enumerate()
            .map(|(i, age)| {
                create_test_property(&i.to_string(), "Danbury", 2000.0, 4, 2.5, "Closed", months_ago(*age), months_ago(*age))
            })
            .collect();

        let kept = filter.filter(&subject(), &listings, now());
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["2", "1"]);
    }
}
