mod criteria;

pub use criteria::{SearchCriteria, SearchCriteriaBuilder, DEFAULT_PROPERTY_TYPES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a listing came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Returned by a real listing provider
    Live,
    /// Placeholder generated when every real strategy came back empty
    Synthetic,
}

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// The location-quality signals a listing is enriched with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// 0-10, lower is safer
    Crime,
    /// 0-10, higher is better
    School,
    /// Miles to the nearest grocery market, lower is closer
    MarketProximity,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::Crime,
        SignalKind::School,
        SignalKind::MarketProximity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::Crime => "crime",
            SignalKind::School => "school",
            SignalKind::MarketProximity => "market_proximity",
        }
    }

    /// Inclusive range a signal value is clamped into.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            SignalKind::Crime | SignalKind::School => (0.0, 10.0),
            SignalKind::MarketProximity => (0.0, f64::INFINITY),
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All enrichment output for one listing, applied in a single step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub crime_score: f64,
    pub school_score: f64,
    /// Miles
    pub market_distance: f64,
    pub overall_score: f64,
    /// Signals that fell back to their neutral value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<SignalKind>,
}

/// A single property listing as it moves through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    /// External identifier (MLS number, or `SAMPLE…` for synthetic data)
    pub id: Option<String>,
    pub source: Source,
    pub address: String,
    pub price: u64,
    pub beds: u32,
    pub baths: f64,
    pub sqft: Option<u32>,
    /// Acres
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub property_type: String,
    pub location: Coordinate,
    pub url: String,
    pub retrieved_at: DateTime<Utc>,
    /// `None` until enrichment has run for this listing
    pub enrichment: Option<Enrichment>,
}

impl ListingRecord {
    pub fn new(address: impl Into<String>, price: u64, location: Coordinate) -> Self {
        Self {
            id: None,
            source: Source::Live,
            address: address.into(),
            price,
            beds: 0,
            baths: 0.0,
            sqft: None,
            lot_size: None,
            year_built: None,
            property_type: String::new(),
            location,
            url: String::new(),
            retrieved_at: Utc::now(),
            enrichment: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn with_rooms(mut self, beds: u32, baths: f64) -> Self {
        self.beds = beds;
        self.baths = baths;
        self
    }

    pub fn with_details(
        mut self,
        sqft: Option<u32>,
        lot_size: Option<f64>,
        year_built: Option<i32>,
    ) -> Self {
        self.sqft = sqft;
        self.lot_size = lot_size;
        self.year_built = year_built;
        self
    }

    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = property_type.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == Source::Synthetic
    }

    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }

    /// A listing is degraded when any of its signals used a neutral default.
    pub fn is_degraded(&self) -> bool {
        self.enrichment
            .as_ref()
            .is_some_and(|e| !e.degraded.is_empty())
    }

    pub fn crime_score(&self) -> Option<f64> {
        self.enrichment.as_ref().map(|e| e.crime_score)
    }

    pub fn school_score(&self) -> Option<f64> {
        self.enrichment.as_ref().map(|e| e.school_score)
    }

    pub fn market_distance(&self) -> Option<f64> {
        self.enrichment.as_ref().map(|e| e.market_distance)
    }

    pub fn overall_score(&self) -> Option<f64> {
        self.enrichment.as_ref().map(|e| e.overall_score)
    }

    /// Sets all enrichment fields at once.
    pub fn apply_enrichment(&mut self, enrichment: Enrichment) {
        self.enrichment = Some(enrichment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> Coordinate {
        Coordinate::new(30.2672, -97.7431)
    }

    #[test]
    fn new_listing_is_unenriched() {
        let listing = ListingRecord::new("123 Main St", 450_000, austin());
        assert!(!listing.is_enriched());
        assert!(!listing.is_degraded());
        assert_eq!(listing.overall_score(), None);
        assert_eq!(listing.crime_score(), None);
        assert_eq!(listing.source, Source::Live);
    }

    #[test]
    fn enrichment_populates_every_signal_together() {
        let mut listing = ListingRecord::new("123 Main St", 450_000, austin());
        listing.apply_enrichment(Enrichment {
            crime_score: 2.0,
            school_score: 8.0,
            market_distance: 1.0,
            overall_score: 7.85,
            degraded: vec![],
        });
        assert_eq!(listing.crime_score(), Some(2.0));
        assert_eq!(listing.school_score(), Some(8.0));
        assert_eq!(listing.market_distance(), Some(1.0));
        assert_eq!(listing.overall_score(), Some(7.85));
        assert!(!listing.is_degraded());
    }

    #[test]
    fn degraded_signals_mark_listing() {
        let mut listing = ListingRecord::new("9 Elm St", 1, austin());
        listing.apply_enrichment(Enrichment {
            crime_score: 5.0,
            school_score: 7.0,
            market_distance: 2.0,
            overall_score: 6.0,
            degraded: vec![SignalKind::Crime],
        });
        assert!(listing.is_degraded());
    }

    #[test]
    fn coordinate_validation() {
        assert!(austin().is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn signal_bounds_clamp() {
        assert_eq!(SignalKind::Crime.clamp(12.0), 10.0);
        assert_eq!(SignalKind::School.clamp(-1.0), 0.0);
        assert_eq!(SignalKind::MarketProximity.clamp(42.0), 42.0);
        assert_eq!(SignalKind::MarketProximity.clamp(-0.5), 0.0);
    }

    #[test]
    fn coordinate_display_uses_four_decimals() {
        assert_eq!(austin().to_string(), "30.2672,-97.7431");
    }
}
