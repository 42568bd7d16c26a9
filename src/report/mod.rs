//! Ranked view over scored listings.
//!
//! [`RankingReport`] sorts listings by overall score (descending). Listings
//! without a score are kept and placed last. Summary statistics and the
//! tabular projection are computed on demand from the ranked listings.

mod sinks;

pub use sinks::{ConsoleReportSink, CsvFileSink, JsonFileSink, ReportSink};

use crate::models::ListingRecord;
use crate::search::StrategyKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Score at or above which a listing counts as high.
pub const HIGH_SCORE_THRESHOLD: f64 = 7.0;
/// Score at or above which a listing counts as medium.
pub const MEDIUM_SCORE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    listings: Vec<ListingRecord>,
    strategy: Option<StrategyKind>,
    synthetic: bool,
    cancelled: bool,
    generated_at: DateTime<Utc>,
}

impl RankingReport {
    /// Sort `listings` best first. Stable: equal scores keep input order.
    pub fn rank(mut listings: Vec<ListingRecord>) -> Self {
        listings.sort_by(compare_scores);
        Self {
            listings,
            strategy: None,
            synthetic: false,
            cancelled: false,
            generated_at: Utc::now(),
        }
    }

    /// Record how the listings were found.
    pub fn with_provenance(mut self, strategy: Option<StrategyKind>, synthetic: bool) -> Self {
        self.strategy = strategy;
        self.synthetic = synthetic;
        self
    }

    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn listings(&self) -> &[ListingRecord] {
        &self.listings
    }

    pub fn into_listings(self) -> Vec<ListingRecord> {
        self.listings
    }

    pub fn top(&self, n: usize) -> &[ListingRecord] {
        &self.listings[..n.min(self.listings.len())]
    }

    /// Listings scoring at least `threshold`, best first.
    pub fn scoring_at_least(&self, threshold: f64) -> impl Iterator<Item = &ListingRecord> {
        self.listings
            .iter()
            .filter(move |l| l.overall_score().is_some_and(|s| s >= threshold))
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn strategy(&self) -> Option<StrategyKind> {
        self.strategy
    }

    /// True when every listing is placeholder data.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// True when enrichment was interrupted and some listings are unscored.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Flat rows in rank order, for table renderers.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.listings
            .iter()
            .enumerate()
            .map(|(idx, listing)| ReportRow::new(idx + 1, listing))
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        let scores: Vec<f64> = self
            .listings
            .iter()
            .filter_map(ListingRecord::overall_score)
            .collect();
        let prices: Vec<u64> = self.listings.iter().map(|l| l.price).collect();

        ReportSummary {
            total: self.listings.len(),
            scored: scores.len(),
            unscored: self.listings.len() - scores.len(),
            degraded: self.listings.iter().filter(|l| l.is_degraded()).count(),
            mean_score: mean(scores.iter().copied()),
            mean_price: mean(prices.iter().map(|p| *p as f64)),
            min_price: prices.iter().min().copied(),
            max_price: prices.iter().max().copied(),
            high: scores.iter().filter(|s| **s >= HIGH_SCORE_THRESHOLD).count(),
            medium: scores
                .iter()
                .filter(|s| (MEDIUM_SCORE_THRESHOLD..HIGH_SCORE_THRESHOLD).contains(*s))
                .count(),
            low: scores.iter().filter(|s| **s < MEDIUM_SCORE_THRESHOLD).count(),
            synthetic: self.synthetic,
            cancelled: self.cancelled,
        }
    }
}

/// Scored listings first (highest score first), unscored listings last.
fn compare_scores(a: &ListingRecord, b: &ListingRecord) -> Ordering {
    match (a.overall_score(), b.overall_score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// One row of the tabular projection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub rank: usize,
    pub address: String,
    pub price: u64,
    pub beds: u32,
    pub baths: f64,
    pub sqft: Option<u32>,
    pub year_built: Option<i32>,
    pub property_type: String,
    pub crime_score: Option<f64>,
    pub school_score: Option<f64>,
    pub market_distance_mi: Option<f64>,
    pub overall_score: Option<f64>,
    pub degraded: bool,
    pub synthetic: bool,
    pub id: Option<String>,
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ReportRow {
    fn new(rank: usize, listing: &ListingRecord) -> Self {
        Self {
            rank,
            address: listing.address.clone(),
            price: listing.price,
            beds: listing.beds,
            baths: listing.baths,
            sqft: listing.sqft,
            year_built: listing.year_built,
            property_type: listing.property_type.clone(),
            crime_score: listing.crime_score(),
            school_score: listing.school_score(),
            market_distance_mi: listing.market_distance(),
            overall_score: listing.overall_score(),
            degraded: listing.is_degraded(),
            synthetic: listing.is_synthetic(),
            id: listing.id.clone(),
            url: listing.url.clone(),
            latitude: listing.location.latitude,
            longitude: listing.location.longitude,
        }
    }
}

/// Aggregate statistics over a report
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub scored: usize,
    pub unscored: usize,
    pub degraded: usize,
    pub mean_score: Option<f64>,
    pub mean_price: Option<f64>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// Score >= 7
    pub high: usize,
    /// 5 <= score < 7
    pub medium: usize,
    /// Score < 5
    pub low: usize,
    pub synthetic: bool,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Enrichment, SignalKind};

    fn scored(address: &str, price: u64, score: f64) -> ListingRecord {
        let mut listing = ListingRecord::new(address, price, Coordinate::new(30.0, -97.0));
        listing.apply_enrichment(Enrichment {
            crime_score: 3.0,
            school_score: 7.0,
            market_distance: 1.5,
            overall_score: score,
            degraded: vec![],
        });
        listing
    }

    fn unscored(address: &str, price: u64) -> ListingRecord {
        ListingRecord::new(address, price, Coordinate::new(30.0, -97.0))
    }

    #[test]
    fn ranks_by_score_descending() {
        let report = RankingReport::rank(vec![
            scored("low", 100, 4.2),
            scored("high", 200, 8.9),
            scored("mid", 300, 6.1),
        ]);
        let order: Vec<&str> = report.listings().iter().map(|l| l.address.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[test]
    fn unscored_listings_rank_last_without_being_dropped() {
        let report = RankingReport::rank(vec![
            unscored("pending-1", 100),
            scored("zero", 200, 0.0),
            unscored("pending-2", 300),
            scored("best", 400, 9.0),
        ]);
        let order: Vec<&str> = report.listings().iter().map(|l| l.address.as_str()).collect();
        assert_eq!(order, vec!["best", "zero", "pending-1", "pending-2"]);
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn top_is_bounded_by_length() {
        let report = RankingReport::rank(vec![scored("a", 1, 5.0), scored("b", 2, 6.0)]);
        assert_eq!(report.top(1).len(), 1);
        assert_eq!(report.top(1)[0].address, "b");
        assert_eq!(report.top(10).len(), 2);
        assert!(RankingReport::rank(vec![]).top(3).is_empty());
    }

    #[test]
    fn summary_statistics() {
        let mut degraded = scored("degraded", 500_000, 5.5);
        if let Some(e) = degraded.enrichment.as_mut() {
            e.degraded.push(SignalKind::School);
        }
        let report = RankingReport::rank(vec![
            scored("a", 300_000, 7.0),
            scored("b", 400_000, 8.5),
            degraded,
            scored("c", 600_000, 3.0),
            unscored("d", 700_000),
        ]);
        let summary = report.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.scored, 4);
        assert_eq!(summary.unscored, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.low, 1);
        assert!((summary.mean_score.unwrap() - 6.0).abs() < 1e-9);
        assert!((summary.mean_price.unwrap() - 500_000.0).abs() < 1e-9);
        assert_eq!(summary.min_price, Some(300_000));
        assert_eq!(summary.max_price, Some(700_000));
    }

    #[test]
    fn empty_summary_has_no_means() {
        let summary = RankingReport::rank(vec![]).summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean_score, None);
        assert_eq!(summary.mean_price, None);
        assert_eq!(summary.min_price, None);
    }

    #[test]
    fn rows_follow_rank_order() {
        let report = RankingReport::rank(vec![
            scored("a", 1, 2.0),
            unscored("b", 2),
            scored("c", 3, 9.0),
        ]);
        let rows = report.rows();
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].address, "c");
        assert_eq!(rows[0].overall_score, Some(9.0));
        assert_eq!(rows[2].address, "b");
        assert_eq!(rows[2].overall_score, None);
        assert_eq!(rows[2].crime_score, None);
    }

    #[test]
    fn threshold_filter() {
        let report = RankingReport::rank(vec![
            scored("a", 1, 7.5),
            scored("b", 2, 6.9),
            unscored("c", 3),
        ]);
        let good: Vec<&str> = report
            .scoring_at_least(7.0)
            .map(|l| l.address.as_str())
            .collect();
        assert_eq!(good, vec!["a"]);
    }
}
