//! Multi-strategy listing search with graceful degradation.
//!
//! Strategies run in the configured order. The first one to return a
//! non-empty set wins; results are never merged across strategies. Empty
//! results and recoverable errors move on to the next strategy. When all
//! real strategies are exhausted, clearly tagged synthetic listings are
//! generated if the fallback is enabled.
//!
//! ```text
//! Init -> TryingStrategy(0) -> ... -> TryingStrategy(n-1)
//!                 |                          |
//!             Succeeded              AllStrategiesExhausted -> Fallback -> Done
//! ```

use super::params::QueryParams;
use super::synthetic::SyntheticListings;
use super::traits::{ListingProvider, LocationResolver, PageFetcher};
use super::url_pattern::filter_url;
use super::StrategyKind;
use crate::config::PipelineConfig;
use crate::error::{Result, ScoutError};
use crate::models::{ListingRecord, SearchCriteria};
use crate::scrapers::listing_page;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where the search state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    TryingStrategy(usize),
    Succeeded(StrategyKind),
    AllStrategiesExhausted,
    Fallback,
    Done,
}

impl SearchState {
    /// `Succeeded` and `Done` end the search.
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Succeeded(_) | SearchState::Done)
    }
}

/// How a single strategy attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Found(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub outcome: AttemptOutcome,
}

/// Listings plus a record of how they were obtained
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub listings: Vec<ListingRecord>,
    /// The strategy that produced the listings; `None` for synthetic or empty results
    pub strategy: Option<StrategyKind>,
    pub synthetic: bool,
    pub attempts: Vec<StrategyAttempt>,
}

pub struct SearchOrchestrator {
    resolver: Arc<dyn LocationResolver>,
    listings: Arc<dyn ListingProvider>,
    page_fetcher: Option<Arc<dyn PageFetcher>>,
    strategy_order: Vec<StrategyKind>,
    synthetic: Option<SyntheticListings>,
    page_size: usize,
    max_pages: usize,
}

impl SearchOrchestrator {
    pub fn new(resolver: Arc<dyn LocationResolver>, listings: Arc<dyn ListingProvider>) -> Self {
        let defaults = PipelineConfig::default();
        Self {
            resolver,
            listings,
            page_fetcher: None,
            strategy_order: defaults.strategy_order,
            synthetic: None,
            page_size: defaults.page_size,
            max_pages: defaults.max_pages,
        }
    }

    pub fn from_config(
        config: &PipelineConfig,
        resolver: Arc<dyn LocationResolver>,
        listings: Arc<dyn ListingProvider>,
        page_fetcher: Option<Arc<dyn PageFetcher>>,
    ) -> Self {
        let synthetic = config.synthetic_fallback.then(|| {
            SyntheticListings::new(
                config.synthetic_count,
                config.synthetic_anchor,
                config.synthetic_seed,
            )
        });
        Self {
            resolver,
            listings,
            page_fetcher,
            strategy_order: config.strategy_order.clone(),
            synthetic,
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }

    pub fn with_page_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.page_fetcher = Some(fetcher);
        self
    }

    pub fn with_strategy_order(mut self, order: Vec<StrategyKind>) -> Self {
        self.strategy_order = order;
        self
    }

    pub fn with_synthetic_fallback(mut self, synthetic: Option<SyntheticListings>) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn with_paging(mut self, page_size: usize, max_pages: usize) -> Self {
        self.page_size = page_size.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    /// Listings for `criteria` from the first strategy that yields any.
    pub async fn search_listings(&self, criteria: &SearchCriteria) -> Result<Vec<ListingRecord>> {
        Ok(self
            .search(criteria, &CancellationToken::new())
            .await?
            .listings)
    }

    /// Run the strategy state machine.
    ///
    /// # Errors
    ///
    /// Unrecoverable errors from a strategy propagate immediately, and
    /// [`ScoutError::Cancelled`] is returned if `cancel` fires before a
    /// result is found.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        info!("Searching properties in {}", criteria.location_label());

        let mut attempts = Vec::new();
        let mut listings = Vec::new();
        let mut synthetic = false;
        let mut state = SearchState::Init;
        while !state.is_terminal() {
            debug!(?state, "search state");
            state = match state {
                SearchState::Init => {
                    if self.strategy_order.is_empty() {
                        SearchState::AllStrategiesExhausted
                    } else {
                        SearchState::TryingStrategy(0)
                    }
                }
                SearchState::TryingStrategy(index) => {
                    if cancel.is_cancelled() {
                        return Err(ScoutError::Cancelled);
                    }
                    let strategy = self.strategy_order[index];
                    let next = if index + 1 < self.strategy_order.len() {
                        SearchState::TryingStrategy(index + 1)
                    } else {
                        SearchState::AllStrategiesExhausted
                    };

                    match self.run_strategy(strategy, criteria, cancel).await {
                        Ok(found) if !found.is_empty() => {
                            info!(%strategy, count = found.len(), "strategy succeeded");
                            attempts.push(StrategyAttempt {
                                strategy,
                                outcome: AttemptOutcome::Found(found.len()),
                            });
                            listings = found;
                            SearchState::Succeeded(strategy)
                        }
                        Ok(_) => {
                            info!(%strategy, "strategy returned no listings, trying next");
                            attempts.push(StrategyAttempt {
                                strategy,
                                outcome: AttemptOutcome::Empty,
                            });
                            next
                        }
                        Err(err) if err.is_recoverable() => {
                            warn!(%strategy, error = %err, "strategy failed, trying next");
                            attempts.push(StrategyAttempt {
                                strategy,
                                outcome: AttemptOutcome::Failed(err.to_string()),
                            });
                            next
                        }
                        Err(err) => return Err(err),
                    }
                }
                SearchState::AllStrategiesExhausted => {
                    if self.synthetic.is_some() {
                        warn!("API methods failed, generating sample data for testing...");
                        SearchState::Fallback
                    } else {
                        warn!("all search strategies exhausted, no listings found");
                        SearchState::Done
                    }
                }
                SearchState::Fallback => {
                    if let Some(generator) = &self.synthetic {
                        listings = generator.generate(criteria);
                        synthetic = true;
                    }
                    SearchState::Done
                }
                terminal @ (SearchState::Succeeded(_) | SearchState::Done) => terminal,
            };
        }
        debug!(?state, "search state");

        let strategy = match state {
            SearchState::Succeeded(strategy) => Some(strategy),
            _ => None,
        };
        Ok(SearchOutcome {
            listings,
            strategy,
            synthetic,
            attempts,
        })
    }

    async fn run_strategy(
        &self,
        strategy: StrategyKind,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListingRecord>> {
        match strategy {
            StrategyKind::RegionApi => self.search_region_api(criteria, cancel).await,
            StrategyKind::UrlPattern => self.search_url_pattern(criteria).await,
        }
    }

    /// Resolve the region, then page through the listing provider.
    async fn search_region_api(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListingRecord>> {
        let region = self
            .resolver
            .resolve_region(criteria.city(), criteria.state())
            .await?
            .ok_or_else(|| {
                ScoutError::Resolution(format!("no region found for {}", criteria.location_label()))
            })?;
        info!(region = %region, "Found region ID");

        let base = QueryParams::from_criteria(criteria, self.page_size);
        let mut listings = Vec::new();
        for page in 0..self.max_pages {
            if cancel.is_cancelled() {
                return Err(ScoutError::Cancelled);
            }
            let params = base.for_page(page);
            let raw = match self.listings.fetch(&region, &params).await {
                Ok(raw) => raw,
                Err(err) if page > 0 && err.is_recoverable() => {
                    warn!(page, error = %err, "listing page failed, keeping earlier pages");
                    break;
                }
                Err(err) => return Err(err),
            };
            let fetched = raw.len();
            debug!(page, fetched, source = self.listings.source_name(), "fetched listing page");
            listings.extend(parse_batch(StrategyKind::RegionApi, &raw, |record| {
                self.listings.parse_record(record)
            }));
            if fetched < self.page_size {
                break;
            }
        }
        Ok(listings)
    }

    /// Search-page URL built from the criteria, parsed from embedded JSON-LD.
    /// Inert when no page fetcher is configured.
    async fn search_url_pattern(&self, criteria: &SearchCriteria) -> Result<Vec<ListingRecord>> {
        let Some(fetcher) = &self.page_fetcher else {
            debug!("no page fetcher configured, url-pattern search skipped");
            return Ok(Vec::new());
        };

        let url = filter_url(fetcher.base_url(), criteria)?;
        info!("Trying alternative search method...");
        debug!(%url, "fetching search page");
        let html = fetcher.fetch_html(&url).await?;
        let records = listing_page::extract_listing_records(&html);
        debug!(count = records.len(), "listing records embedded in page");

        Ok(parse_batch(StrategyKind::UrlPattern, &records, |record| {
            listing_page::parse_listing_record(record, fetcher.base_url())
        }))
    }
}

/// Map every raw record, skipping malformed ones with a warning.
fn parse_batch<F>(strategy: StrategyKind, raw: &[Value], parse: F) -> Vec<ListingRecord>
where
    F: Fn(&Value) -> Result<ListingRecord>,
{
    let mut listings = Vec::with_capacity(raw.len());
    for (index, record) in raw.iter().enumerate() {
        match parse(record) {
            Ok(listing) => listings.push(listing),
            Err(err) => {
                warn!(%strategy, record = index, error = %err, "skipping malformed listing record");
            }
        }
    }
    listings
}
