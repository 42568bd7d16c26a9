use super::{RankingReport, ReportRow, ReportSummary};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for a finished report
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, report: &RankingReport) -> Result<()>;

    fn sink_name(&self) -> &'static str;
}

/// Prints the top listings and a summary block to stdout.
pub struct ConsoleReportSink {
    top_n: usize,
}

impl ConsoleReportSink {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// The text `write` prints.
    pub fn render(&self, report: &RankingReport) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out, report);
        out
    }

    fn render_into(&self, out: &mut String, report: &RankingReport) -> std::fmt::Result {
        if report.is_synthetic() {
            writeln!(out, "NOTE: no live listings were found; showing sample data.")?;
        }
        if report.is_cancelled() {
            writeln!(out, "NOTE: run was cancelled; some listings were not scored.")?;
        }

        writeln!(out, "\n=== TOP {} PROPERTIES ===\n", self.top_n)?;
        for (i, listing) in report.top(self.top_n).iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, listing.address)?;
            writeln!(out, "   Price: ${}", thousands(listing.price))?;
            writeln!(out, "   Beds/Baths: {}/{}", listing.beds, listing.baths)?;
            match &listing.enrichment {
                Some(e) => {
                    writeln!(out, "   Overall Score: {}/10", e.overall_score)?;
                    writeln!(out, "   Crime Score: {:.1}/10 (lower better)", e.crime_score)?;
                    writeln!(out, "   School Score: {:.1}/10", e.school_score)?;
                    writeln!(out, "   Market Distance: {:.1} miles", e.market_distance)?;
                    if !e.degraded.is_empty() {
                        let kinds: Vec<&str> = e.degraded.iter().map(|k| k.name()).collect();
                        writeln!(out, "   Estimated: {}", kinds.join(", "))?;
                    }
                }
                None => writeln!(out, "   Overall Score: not scored")?,
            }
            writeln!(out, "   URL: {}", listing.url)?;
            writeln!(out)?;
        }

        let summary = report.summary();
        writeln!(out, "Summary:")?;
        writeln!(out, "Total properties analyzed: {}", summary.total)?;
        if let Some(mean) = summary.mean_score {
            writeln!(out, "Average overall score: {mean:.2}/10")?;
        }
        if let Some(mean) = summary.mean_price {
            writeln!(out, "Average price: ${}", thousands(mean.round() as u64))?;
        }
        if let (Some(min), Some(max)) = (summary.min_price, summary.max_price) {
            writeln!(out, "Price range: ${} - ${}", thousands(min), thousands(max))?;
        }
        if summary.unscored > 0 {
            writeln!(out, "Not scored: {}", summary.unscored)?;
        }
        if summary.degraded > 0 {
            writeln!(out, "With estimated signals: {}", summary.degraded)?;
        }
        writeln!(out, "\nScore Distribution:")?;
        writeln!(out, "High Score (7-10): {} properties", summary.high)?;
        writeln!(out, "Medium Score (5-7): {} properties", summary.medium)?;
        writeln!(out, "Low Score (0-5): {} properties", summary.low)?;
        Ok(())
    }
}

impl Default for ConsoleReportSink {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl ReportSink for ConsoleReportSink {
    async fn write(&self, report: &RankingReport) -> Result<()> {
        print!("{}", self.render(report));
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "console"
    }
}

/// Writes the full tabular projection as pretty JSON.
pub struct JsonFileSink {
    path: PathBuf,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    strategy: Option<&'static str>,
    summary: ReportSummary,
    listings: &'a [ReportRow],
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    async fn write(&self, report: &RankingReport) -> Result<()> {
        let rows = report.rows();
        let document = JsonReport {
            generated_at: report.generated_at(),
            strategy: report.strategy().map(|s| s.name()),
            summary: report.summary(),
            listings: &rows,
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| ScoutError::Output(format!("failed to serialize report: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ScoutError::Output(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            ScoutError::Output(format!("failed to write {}: {e}", self.path.display()))
        })?;

        info!(path = %self.path.display(), listings = rows.len(), "Saved report");
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "json"
    }
}

/// Writes one CSV row per listing in rank order.
pub struct CsvFileSink {
    path: PathBuf,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Address")]
    address: &'a str,
    #[serde(rename = "Price")]
    price: u64,
    #[serde(rename = "Beds")]
    beds: u32,
    #[serde(rename = "Baths")]
    baths: f64,
    #[serde(rename = "SqFt")]
    sqft: Option<u32>,
    #[serde(rename = "Year Built")]
    year_built: Option<i32>,
    #[serde(rename = "Property Type")]
    property_type: &'a str,
    #[serde(rename = "Crime Score")]
    crime_score: Option<f64>,
    #[serde(rename = "School Score")]
    school_score: Option<f64>,
    #[serde(rename = "Market Distance (mi)")]
    market_distance_mi: Option<f64>,
    #[serde(rename = "Overall Score")]
    overall_score: Option<f64>,
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

impl<'a> From<&'a ReportRow> for CsvRow<'a> {
    fn from(row: &'a ReportRow) -> Self {
        Self {
            address: &row.address,
            price: row.price,
            beds: row.beds,
            baths: row.baths,
            sqft: row.sqft,
            year_built: row.year_built,
            property_type: &row.property_type,
            crime_score: row.crime_score,
            school_score: row.school_score,
            market_distance_mi: row.market_distance_mi,
            overall_score: row.overall_score,
            url: &row.url,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn csv_error(e: impl std::fmt::Display) -> ScoutError {
    ScoutError::Output(format!("failed to encode CSV report: {e}"))
}

#[async_trait]
impl ReportSink for CsvFileSink {
    async fn write(&self, report: &RankingReport) -> Result<()> {
        let rows = report.rows();
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &rows {
            writer.serialize(CsvRow::from(row)).map_err(csv_error)?;
        }
        let bytes = writer.into_inner().map_err(csv_error)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ScoutError::Output(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            ScoutError::Output(format!("failed to write {}: {e}", self.path.display()))
        })?;

        info!(path = %self.path.display(), listings = rows.len(), "Saved CSV report");
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "csv"
    }
}

/// 1234567 -> "1,234,567"
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
