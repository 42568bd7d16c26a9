//! Location-quality enrichment.
//!
//! [`Enricher`] holds one [`EnrichmentSource`] per [`SignalKind`] and turns
//! each listing's coordinate into crime, school and market-proximity
//! signals plus the overall score, applied to the listing in one step.
//! Listings are enriched through a bounded pool of concurrent tasks; the
//! three lookups for one listing also run concurrently.

pub mod cache;
pub mod providers;
mod source;
mod throttle;

pub use cache::{CoordinateKey, EnrichmentCache};
pub use providers::{SignalProvider, SignalProviders, SimulatedSignalProvider};
pub use source::{EnrichmentSource, SignalReading};

use crate::config::PipelineConfig;
use crate::error::{Result, ScoutError};
use crate::models::{Coordinate, Enrichment, ListingRecord, SignalKind};
use crate::scoring::{ScoringEngine, SignalValues};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Counts from one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub enriched: usize,
    pub degraded: usize,
    /// Listings left unenriched because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
}

pub struct Enricher {
    sources: Vec<EnrichmentSource>,
    scorer: ScoringEngine,
    concurrency: usize,
}

impl Enricher {
    /// Builds an enricher from one source per signal kind.
    ///
    /// # Errors
    ///
    /// [`ScoutError::Configuration`] if a kind is missing or repeated, or
    /// `concurrency` is zero.
    pub fn new(
        sources: Vec<EnrichmentSource>,
        scorer: ScoringEngine,
        concurrency: usize,
    ) -> Result<Self> {
        for kind in SignalKind::ALL {
            let count = sources.iter().filter(|s| s.kind() == kind).count();
            if count != 1 {
                return Err(ScoutError::Configuration(format!(
                    "expected exactly one {kind} source, found {count}"
                )));
            }
        }
        if sources.len() != SignalKind::ALL.len() {
            return Err(ScoutError::Configuration(
                "unexpected extra enrichment source".into(),
            ));
        }
        if concurrency == 0 {
            return Err(ScoutError::Configuration(
                "enrichment concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self {
            sources,
            scorer,
            concurrency,
        })
    }

    /// Wires the configured cache precision, delay, timeout and market
    /// neutral value (half the distance horizon) around `providers`.
    pub fn from_config(config: &PipelineConfig, providers: &SignalProviders) -> Result<Self> {
        let scorer = ScoringEngine::new(config.weights, config.distance_horizon_miles)?;
        let sources = SignalKind::ALL
            .iter()
            .map(|kind| {
                let source =
                    EnrichmentSource::new(*kind, providers.get(*kind), config.coordinate_precision)
                        .with_timeout(config.signal_timeout())
                        .with_request_delay(config.request_delay());
                match kind {
                    SignalKind::MarketProximity => {
                        source.with_neutral(config.distance_horizon_miles / 2.0)
                    }
                    _ => source,
                }
            })
            .collect();
        Self::new(sources, scorer, config.enrichment_concurrency)
    }

    pub fn source(&self, kind: SignalKind) -> Option<&EnrichmentSource> {
        self.sources.iter().find(|s| s.kind() == kind)
    }

    pub fn scorer(&self) -> &ScoringEngine {
        &self.scorer
    }

    /// Signals and overall score for one listing. Does not modify it.
    pub async fn enrich_listing(&self, listing: &ListingRecord) -> Enrichment {
        self.enrich_coordinate(listing.location).await
    }

    async fn enrich_coordinate(&self, coordinate: Coordinate) -> Enrichment {
        let readings = futures::future::join_all(self.sources.iter().map(|source| async move {
            let reading = source
                .score(coordinate.latitude, coordinate.longitude)
                .await;
            (source.kind(), reading)
        }))
        .await;

        let mut values = SignalValues {
            crime_score: 0.0,
            school_score: 0.0,
            market_distance: 0.0,
        };
        let mut degraded = Vec::new();
        for (kind, reading) in readings {
            match kind {
                SignalKind::Crime => values.crime_score = reading.value,
                SignalKind::School => values.school_score = reading.value,
                SignalKind::MarketProximity => values.market_distance = reading.value,
            }
            if reading.degraded {
                degraded.push(kind);
            }
        }

        Enrichment {
            crime_score: values.crime_score,
            school_score: values.school_score,
            market_distance: values.market_distance,
            overall_score: self.scorer.score(&values),
            degraded,
        }
    }

    /// Enriches every listing in place.
    ///
    /// Once `cancel` fires no new listing is started; listings already in
    /// flight finish and are applied. The rest stay unenriched.
    pub async fn enrich_all(
        &self,
        listings: &mut [ListingRecord],
        cancel: &CancellationToken,
    ) -> EnrichmentSummary {
        let total = listings.len();
        info!("Analyzing {} properties...", total);

        let pending: Vec<(usize, Coordinate)> = listings
            .iter()
            .enumerate()
            .map(|(idx, listing)| (idx, listing.location))
            .collect();

        let gate = cancel.clone();
        let mut results = stream::iter(pending)
            .take_while(move |_| futures::future::ready(!gate.is_cancelled()))
            .map(|(idx, coordinate)| async move { (idx, self.enrich_coordinate(coordinate).await) })
            .buffer_unordered(self.concurrency);

        let mut summary = EnrichmentSummary::default();
        while let Some((idx, enrichment)) = results.next().await {
            let listing = &mut listings[idx];
            if !enrichment.degraded.is_empty() {
                summary.degraded += 1;
                let degraded: Vec<&str> = enrichment.degraded.iter().map(|k| k.name()).collect();
                warn!(
                    address = %listing.address,
                    signals = ?degraded,
                    "listing enriched with neutral defaults"
                );
            }
            info!(
                "Analyzed property {}/{}: {} (score {:.2})",
                idx + 1,
                total,
                listing.address,
                enrichment.overall_score
            );
            listing.apply_enrichment(enrichment);
            summary.enriched += 1;
        }

        summary.skipped = total - summary.enriched;
        summary.cancelled = cancel.is_cancelled() && summary.skipped > 0;
        if summary.cancelled {
            warn!(
                enriched = summary.enriched,
                skipped = summary.skipped,
                "enrichment interrupted"
            );
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringWeights;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedProvider {
        value: f64,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(value: f64) -> Arc<Self> {
            Arc::new(Self {
                value,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SignalProvider for FixedProvider {
        async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    struct DownProvider;

    #[async_trait]
    impl SignalProvider for DownProvider {
        async fn query(&self, _coordinate: Coordinate) -> Result<f64> {
            Err(ScoutError::Provider("connection reset".into()))
        }

        fn provider_name(&self) -> &'static str {
            "down"
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            request_delay_ms: 0,
            ..Default::default()
        }
    }

    fn listing(address: &str, lat: f64, lon: f64) -> ListingRecord {
        ListingRecord::new(address, 400_000, Coordinate::new(lat, lon))
    }

    #[tokio::test]
    async fn enriches_with_worked_example() {
        let providers = SignalProviders {
            crime: FixedProvider::new(2.0),
            school: FixedProvider::new(8.0),
            market: FixedProvider::new(1.0),
        };
        let enricher = Enricher::from_config(&config(), &providers).unwrap();
        let enrichment = enricher
            .enrich_listing(&listing("1 Main St", 30.0, -97.0))
            .await;
        assert_eq!(enrichment.crime_score, 2.0);
        assert_eq!(enrichment.school_score, 8.0);
        assert_eq!(enrichment.market_distance, 1.0);
        assert!((enrichment.overall_score - 7.85).abs() < 1e-9);
        assert!(enrichment.degraded.is_empty());
    }

    #[tokio::test]
    async fn shared_bucket_hits_each_provider_once() {
        let crime = FixedProvider::new(4.0);
        let school = FixedProvider::new(6.0);
        let market = FixedProvider::new(2.0);
        let providers = SignalProviders {
            crime: crime.clone(),
            school: school.clone(),
            market: market.clone(),
        };
        let enricher = Enricher::from_config(&config(), &providers).unwrap();

        let mut listings = vec![
            listing("1 Main St", 30.26721, -97.74311),
            listing("1 Main St Unit B", 30.26719, -97.74309),
            listing("2 Oak Ave", 30.3, -97.8),
        ];
        let summary = enricher
            .enrich_all(&mut listings, &CancellationToken::new())
            .await;

        assert_eq!(summary.enriched, 3);
        assert_eq!(summary.skipped, 0);
        assert!(!summary.cancelled);
        assert!(listings.iter().all(ListingRecord::is_enriched));
        assert_eq!(crime.calls.load(Ordering::SeqCst), 2);
        assert_eq!(school.calls.load(Ordering::SeqCst), 2);
        assert_eq!(market.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_failure_marks_listing_degraded() {
        let providers = SignalProviders {
            crime: Arc::new(DownProvider),
            school: FixedProvider::new(8.0),
            market: FixedProvider::new(1.0),
        };
        let enricher = Enricher::from_config(&config(), &providers).unwrap();
        let mut listings = vec![listing("1 Main St", 30.0, -97.0)];
        let summary = enricher
            .enrich_all(&mut listings, &CancellationToken::new())
            .await;

        assert_eq!(summary.degraded, 1);
        let enrichment = listings[0].enrichment.as_ref().unwrap();
        assert_eq!(enrichment.crime_score, 5.0);
        assert_eq!(enrichment.degraded, vec![SignalKind::Crime]);
        assert!(listings[0].is_degraded());
    }

    #[tokio::test]
    async fn cancelled_before_start_leaves_everything_unenriched() {
        let enricher =
            Enricher::from_config(&config(), &SignalProviders::simulated(Some(3))).unwrap();
        let mut listings = vec![listing("1 Main St", 30.0, -97.0), listing("2 Oak", 30.1, -97.1)];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = enricher.enrich_all(&mut listings, &cancel).await;
        assert_eq!(summary.enriched, 0);
        assert_eq!(summary.skipped, 2);
        assert!(summary.cancelled);
        assert!(listings.iter().all(|l| l.enrichment.is_none()));
    }

    #[test]
    fn rejects_missing_or_duplicate_sources() {
        let provider: Arc<dyn SignalProvider> = FixedProvider::new(1.0);
        let sources = vec![
            EnrichmentSource::new(SignalKind::Crime, provider.clone(), 4),
            EnrichmentSource::new(SignalKind::Crime, provider.clone(), 4),
            EnrichmentSource::new(SignalKind::School, provider, 4),
        ];
        let err = Enricher::new(sources, ScoringEngine::default(), 2)
            .err()
            .expect("duplicate crime source must be rejected");
        assert!(err.to_string().contains("crime"));
    }

    #[test]
    fn market_neutral_tracks_horizon() {
        let config = PipelineConfig {
            distance_horizon_miles: 6.0,
            ..config()
        };
        let enricher = Enricher::from_config(&config, &SignalProviders::simulated(None)).unwrap();
        let market = enricher.source(SignalKind::MarketProximity).unwrap();
        assert_eq!(market.neutral(), 3.0);
        assert_eq!(enricher.scorer().weights(), ScoringWeights::default());
    }
}
