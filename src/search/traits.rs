use super::params::QueryParams;
use super::record::{parse_generic_record, RegionId};
use crate::error::Result;
use crate::models::ListingRecord;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Maps a city and state to the provider's region identifier
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// `Ok(None)` when the provider knows no matching region.
    async fn resolve_region(&self, city: &str, state: &str) -> Result<Option<RegionId>>;
}

/// Source of raw listing payloads for a region
///
/// This allows easy addition of new listing sources in the future
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// One page of raw listing records
    async fn fetch(&self, region: &RegionId, params: &QueryParams) -> Result<Vec<Value>>;

    /// Map one raw record into a listing. Defaults to the flat schema
    /// understood by [`parse_generic_record`].
    fn parse_record(&self, raw: &Value) -> Result<ListingRecord> {
        parse_generic_record(raw)
    }

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}

/// Fetches rendered HTML for a search page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Site root that search paths are joined onto
    fn base_url(&self) -> &Url;

    async fn fetch_html(&self, url: &Url) -> Result<String>;
}
