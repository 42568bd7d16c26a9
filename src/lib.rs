//! # property-scout
//!
//! Finds real-estate listings matching a buyer's criteria, enriches each one
//! with location-quality signals and ranks them by a single comparable score.
//!
//! ## Design
//!
//! - Listing search tries a configured list of strategies in order and keeps
//!   the first non-empty result. When every strategy comes up empty, it can
//!   fall back to synthetic listings that are clearly tagged as such.
//! - Crime, school and market-proximity signals are fetched through pluggable
//!   providers and cached per rounded coordinate, so each location is queried
//!   at most once per run.
//! - A failed signal lookup degrades to a neutral value instead of dropping
//!   the listing.
//! - Scoring is a pure weighted sum of normalized signals on a 0–10 scale.

pub mod config;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod scrapers;
pub mod search;

pub use config::PipelineConfig;
pub use enrichment::{Enricher, SignalProvider, SignalProviders};
pub use error::{Result, ScoutError};
pub use models::{Coordinate, Enrichment, ListingRecord, SearchCriteria, SignalKind, Source};
pub use pipeline::{Collaborators, PropertyScout};
pub use report::{RankingReport, ReportSink};
pub use scoring::{ScoringEngine, ScoringWeights};
pub use search::{ListingProvider, LocationResolver, PageFetcher, StrategyKind};

/// Rank listings for `criteria` against Redfin with simulated signals.
///
/// # Errors
///
/// [`ScoutError::Configuration`] for an invalid `config` or an HTTP client
/// that cannot be built. Search and signal failures are recovered inside the
/// run and never surface here.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> property_scout::Result<()> {
/// let criteria = property_scout::SearchCriteria::builder("Austin", "TX")
///     .price(300_000, 800_000)
///     .build()?;
/// let report = property_scout::scout(&criteria, property_scout::PipelineConfig::default()).await?;
/// for listing in report.top(5) {
///     println!("{}: {:?}", listing.address, listing.overall_score());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn scout(criteria: &SearchCriteria, config: PipelineConfig) -> Result<RankingReport> {
    let seed = config.synthetic_seed;
    let collaborators = Collaborators::redfin(scrapers::RedfinClient::new()?, seed);
    PropertyScout::new(config, collaborators)?.run(criteria).await
}
