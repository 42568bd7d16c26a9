//! End-to-end run: search, enrich, rank.

use crate::config::PipelineConfig;
use crate::enrichment::{Enricher, SignalProviders};
use crate::error::Result;
use crate::models::SearchCriteria;
use crate::report::RankingReport;
use crate::scrapers::RedfinClient;
use crate::search::{ListingProvider, LocationResolver, PageFetcher, SearchOrchestrator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// External services the pipeline talks to
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn LocationResolver>,
    pub listings: Arc<dyn ListingProvider>,
    /// Enables the URL-pattern strategy
    pub page_fetcher: Option<Arc<dyn PageFetcher>>,
    pub signals: SignalProviders,
}

impl Collaborators {
    /// Redfin for search, simulated signal providers for enrichment.
    pub fn redfin(client: RedfinClient, seed: Option<u64>) -> Self {
        let client = Arc::new(client);
        Self {
            resolver: client.clone(),
            listings: client.clone(),
            page_fetcher: Some(client),
            signals: SignalProviders::simulated(seed),
        }
    }

    pub fn with_page_fetcher(mut self, fetcher: Option<Arc<dyn PageFetcher>>) -> Self {
        self.page_fetcher = fetcher;
        self
    }
}

/// Finds, enriches and ranks listings for a set of criteria.
///
/// Signal caches belong to a single run: every call to
/// [`run`](Self::run) starts with empty caches.
pub struct PropertyScout {
    config: PipelineConfig,
    search: SearchOrchestrator,
    signals: SignalProviders,
}

impl PropertyScout {
    /// # Errors
    ///
    /// [`crate::ScoutError::Configuration`] if `config` does not validate.
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            resolver,
            listings,
            page_fetcher,
            signals,
        } = collaborators;

        // Surfaces weight and horizon errors before the first run.
        Enricher::from_config(&config, &signals)?;
        let search = SearchOrchestrator::from_config(&config, resolver, listings, page_fetcher);
        Ok(Self {
            config,
            search,
            signals,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, criteria: &SearchCriteria) -> Result<RankingReport> {
        self.run_with_cancel(criteria, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), stopping early when `cancel` fires.
    ///
    /// Cancellation during search returns [`crate::ScoutError::Cancelled`].
    /// During enrichment it returns a report flagged as cancelled, with the
    /// listings not yet started left unscored.
    pub async fn run_with_cancel(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<RankingReport> {
        let outcome = self.search.search(criteria, cancel).await?;
        let mut listings = outcome.listings;

        if listings.is_empty() {
            info!("No properties found matching criteria");
        }

        let enricher = Enricher::from_config(&self.config, &self.signals)?;
        let summary = enricher.enrich_all(&mut listings, cancel).await;
        info!(
            enriched = summary.enriched,
            degraded = summary.degraded,
            skipped = summary.skipped,
            "enrichment finished"
        );

        Ok(RankingReport::rank(listings)
            .with_provenance(outcome.strategy, outcome.synthetic)
            .with_cancelled(summary.cancelled))
    }
}
