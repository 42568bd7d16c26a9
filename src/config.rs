//! Pipeline configuration with documented defaults.
//!
//! Every tunable of a run lives in [`PipelineConfig`]. Nothing in the
//! library reads environment variables or global state; the binary maps
//! its command-line flags onto this struct.

use crate::error::{Result, ScoutError};
use crate::models::Coordinate;
use crate::scoring::ScoringWeights;
use crate::search::StrategyKind;
use std::collections::HashSet;
use std::time::Duration;

/// Centre of Austin, TX. Synthetic listings are scattered around it.
pub const DEFAULT_SYNTHETIC_ANCHOR: Coordinate = Coordinate {
    latitude: 30.2672,
    longitude: -97.7431,
};

/// Configuration for a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Weights for crime, school and market proximity. Must sum to 1.0.
    pub weights: ScoringWeights,
    /// Market distance (miles) at or beyond which proximity contributes nothing.
    pub distance_horizon_miles: f64,
    /// Decimal places coordinates are rounded to for cache keys.
    /// 4 places is roughly 11 m.
    pub coordinate_precision: u32,
    /// Real search strategies, tried in this order.
    pub strategy_order: Vec<StrategyKind>,
    /// Generate placeholder listings when every strategy comes back empty.
    pub synthetic_fallback: bool,
    /// Number of synthetic listings generated.
    pub synthetic_count: usize,
    /// Centre point for synthetic listing coordinates.
    pub synthetic_anchor: Coordinate,
    /// Fixed RNG seed for synthetic listings. `None` draws from entropy.
    pub synthetic_seed: Option<u64>,
    /// Listings requested per page from the listing provider.
    pub page_size: usize,
    /// Upper bound on pages fetched per search.
    pub max_pages: usize,
    /// Listings enriched concurrently.
    pub enrichment_concurrency: usize,
    /// Minimum spacing between successive external signal queries, per signal.
    pub request_delay_ms: u64,
    /// Timeout for a single signal provider query.
    pub signal_timeout_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            distance_horizon_miles: 4.0,
            coordinate_precision: 4,
            strategy_order: vec![StrategyKind::RegionApi, StrategyKind::UrlPattern],
            synthetic_fallback: true,
            synthetic_count: 10,
            synthetic_anchor: DEFAULT_SYNTHETIC_ANCHOR,
            synthetic_seed: None,
            page_size: 350,
            max_pages: 1,
            enrichment_concurrency: 4,
            request_delay_ms: 100,
            signal_timeout_seconds: 10,
        }
    }
}

impl PipelineConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn signal_timeout(&self) -> Duration {
        Duration::from_secs(self.signal_timeout_seconds)
    }

    /// Checks every field, returning [`ScoutError::Configuration`] on the
    /// first invalid one.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !self.distance_horizon_miles.is_finite() || self.distance_horizon_miles <= 0.0 {
            return Err(ScoutError::Configuration(
                "distance_horizon_miles must be a positive number".into(),
            ));
        }
        if self.coordinate_precision > 9 {
            return Err(ScoutError::Configuration(
                "coordinate_precision must be at most 9".into(),
            ));
        }
        if self.strategy_order.is_empty() {
            return Err(ScoutError::Configuration(
                "strategy_order must name at least one strategy".into(),
            ));
        }
        let mut seen = HashSet::new();
        for kind in &self.strategy_order {
            if !seen.insert(*kind) {
                return Err(ScoutError::Configuration(format!(
                    "strategy {kind} listed more than once"
                )));
            }
        }
        if self.synthetic_fallback && self.synthetic_count == 0 {
            return Err(ScoutError::Configuration(
                "synthetic_count must be greater than 0 when synthetic fallback is enabled".into(),
            ));
        }
        if !self.synthetic_anchor.is_valid() {
            return Err(ScoutError::Configuration(
                "synthetic_anchor is not a valid coordinate".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(ScoutError::Configuration(
                "page_size must be greater than 0".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ScoutError::Configuration(
                "max_pages must be greater than 0".into(),
            ));
        }
        if self.enrichment_concurrency == 0 {
            return Err(ScoutError::Configuration(
                "enrichment_concurrency must be greater than 0".into(),
            ));
        }
        if self.signal_timeout_seconds == 0 {
            return Err(ScoutError::Configuration(
                "signal_timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
