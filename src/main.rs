//! property-scout CLI: search, score and rank listings for one city.
//!
//! ```bash
//! property-scout Austin TX --min-price 300000 --max-price 800000 --min-beds 2 --max-beds 4
//! property-scout Austin TX --types house,condo --json report.json --top 5
//! property-scout Austin TX --csv listings.csv
//! RUST_LOG=property_scout=debug property-scout Austin TX --seed 42
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use property_scout::report::{
    ConsoleReportSink, CsvFileSink, JsonFileSink, RankingReport, ReportSink,
};
use property_scout::scrapers::{BrowserPageFetcher, RedfinClient, REDFIN_BASE_URL};
use property_scout::{
    Collaborators, PageFetcher, PipelineConfig, PropertyScout, ScoringWeights, ScoutError,
    SearchCriteria, StrategyKind,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Find listings, enrich them with location signals and rank them.
#[derive(Parser)]
#[command(name = "property-scout", version, about)]
struct Cli {
    /// City to search
    #[arg(default_value = "Austin")]
    city: String,

    /// State abbreviation
    #[arg(default_value = "TX")]
    state: String,

    #[arg(long, default_value_t = 300_000)]
    min_price: u64,

    #[arg(long, default_value_t = 800_000)]
    max_price: u64,

    #[arg(long, default_value_t = 2)]
    min_beds: u32,

    #[arg(long, default_value_t = 4)]
    max_beds: u32,

    #[arg(long, default_value_t = 2.0)]
    min_baths: f64,

    #[arg(long, default_value_t = 10.0)]
    max_baths: f64,

    /// Accepted property types, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = ["house".to_string(), "condo".to_string()]
    )]
    types: Vec<String>,

    /// Number of listings printed
    #[arg(short = 'n', long, default_value_t = 10)]
    top: usize,

    /// Also write the full report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write one row per listing as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Search strategies in the order they are tried
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [StrategyKind::RegionApi, StrategyKind::UrlPattern]
    )]
    strategies: Vec<StrategyKind>,

    /// Render search pages with headless Chrome instead of plain HTTP
    #[arg(long)]
    browser: bool,

    /// Do not fall back to sample listings when nothing is found
    #[arg(long)]
    no_synthetic: bool,

    /// Seed for simulated signals and sample listings
    #[arg(long)]
    seed: Option<u64>,

    /// Weights for crime, school and market proximity, comma separated
    #[arg(long, value_delimiter = ',')]
    weights: Option<Vec<f64>>,

    /// Market distance in miles beyond which proximity scores zero
    #[arg(long, default_value_t = 4.0)]
    horizon: f64,

    /// Listings enriched concurrently
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn criteria(&self) -> property_scout::Result<SearchCriteria> {
        SearchCriteria::builder(&self.city, &self.state)
            .price(self.min_price, self.max_price)
            .beds(self.min_beds, self.max_beds)
            .baths(self.min_baths, self.max_baths)
            .property_types(self.types.iter())
            .build()
    }

    fn config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig {
            distance_horizon_miles: self.horizon,
            strategy_order: self.strategies.clone(),
            synthetic_fallback: !self.no_synthetic,
            synthetic_seed: self.seed,
            enrichment_concurrency: self.concurrency,
            ..PipelineConfig::default()
        };
        match self.weights.as_deref() {
            None => {}
            Some([crime, school, market]) => {
                config.weights = ScoringWeights::new(*crime, *school, *market);
            }
            Some(other) => anyhow::bail!("--weights takes three values, got {}", other.len()),
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "property_scout=debug" } else { "property_scout=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("🏠 Property Scout");

    let criteria = cli.criteria().context("invalid search criteria")?;
    let config = cli.config()?;

    info!("Location: {}", criteria.location_label());
    let (min_price, max_price) = criteria.price_range();
    info!("Price Range: ${} - ${}", min_price, max_price);
    let (min_beds, max_beds) = criteria.bed_range();
    info!("Bedrooms: {} - {}", min_beds, max_beds);
    let (min_baths, max_baths) = criteria.bath_range();
    info!("Bathrooms: {} - {}", min_baths, max_baths);
    let types: Vec<&str> = criteria.property_types().iter().map(String::as_str).collect();
    info!("Property Types: {}", types.join(", "));

    let client = RedfinClient::new().context("failed to create Redfin client")?;
    let mut collaborators = Collaborators::redfin(client, cli.seed);
    if cli.browser {
        let fetcher = BrowserPageFetcher::new(REDFIN_BASE_URL)
            .context("failed to start headless Chrome")?
            .with_settle_time(Duration::from_secs(8));
        let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);
        collaborators = collaborators.with_page_fetcher(Some(fetcher));
    }

    let scout =
        PropertyScout::new(config, collaborators).context("invalid pipeline configuration")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing listings already in progress...");
            on_interrupt.cancel();
        }
    });

    let Some(report) = finished(scout.run_with_cancel(&criteria, &cancel).await)? else {
        println!("\nSearch interrupted by user");
        return Ok(());
    };

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(ConsoleReportSink::new(cli.top))];
    if let Some(path) = &cli.json {
        sinks.push(Box::new(JsonFileSink::new(path)));
    }
    if let Some(path) = &cli.csv {
        sinks.push(Box::new(CsvFileSink::new(path)));
    }
    for sink in &sinks {
        sink.write(&report)
            .await
            .with_context(|| format!("failed to write {} report", sink.sink_name()))?;
    }

    Ok(())
}

/// `None` when the user interrupted the search before any listing was found.
fn finished(result: property_scout::Result<RankingReport>) -> Result<Option<RankingReport>> {
    match result {
        Ok(report) => Ok(Some(report)),
        Err(ScoutError::Cancelled) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e).context("property search failed")),
    }
}
