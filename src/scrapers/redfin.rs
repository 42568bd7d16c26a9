use crate::error::{Result, ScoutError};
use crate::models::{Coordinate, ListingRecord};
use crate::search::record::validate_listing;
use crate::search::{
    resolve_region_id, ListingProvider, LocationResolver, PageFetcher, QueryParams, RegionId,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const REDFIN_BASE_URL: &str = "https://www.redfin.com";

/// Redfin prefixes JSON responses with this to defeat JSON hijacking
const JSON_HIJACK_PREFIX: &str = "{}&&";

/// City region type in Redfin's GIS API
const CITY_REGION_TYPE: u32 = 6;

const SQFT_PER_ACRE: f64 = 43_560.0;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
);

/// Redfin client for region lookup, the GIS listing API and search pages
pub struct RedfinClient {
    client: Client,
    base_url: Url,
}

impl RedfinClient {
    /// Create a new client against redfin.com
    pub fn new() -> Result<Self> {
        Self::with_base_url(REDFIN_BASE_URL, Duration::from_secs(30))
    }

    /// Create a new client against a custom host (mirrors, test servers)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScoutError::Configuration(format!("invalid base URL {base_url}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        if let Ok(referer) = HeaderValue::from_str(base_url.as_str()) {
            headers.insert(REFERER, referer);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ScoutError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ScoutError::Configuration(format!("invalid endpoint {path}: {e}")))
    }

    async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<String> {
        debug!("Fetching URL: {}", url);
        let response = self.client.get(url.clone()).query(query).send().await?;

        if !response.status().is_success() {
            warn!("Redfin returned status: {}", response.status());
            return Err(ScoutError::Provider(format!(
                "{} returned {}",
                url.path(),
                response.status()
            )));
        }

        let text = response.text().await?;
        debug!("Downloaded {} bytes", text.len());
        Ok(text)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint(path)?;
        let text = self.get_text(url, query).await?;
        Ok(serde_json::from_str(strip_hijack_prefix(&text))?)
    }
}

#[async_trait]
impl LocationResolver for RedfinClient {
    async fn resolve_region(&self, city: &str, state: &str) -> Result<Option<RegionId>> {
        let query = [
            ("location", format!("{city}, {state}")),
            ("start", "0".to_string()),
            ("count", "10".to_string()),
            ("v", "2".to_string()),
        ];
        let data = self.get_json("/stingray/api/location/search", &query).await?;

        let region = resolve_region_id(&data);
        match &region {
            Some(id) => info!("Found region ID: {}", id),
            None => warn!("Could not find region ID in response structure"),
        }
        Ok(region)
    }
}

#[async_trait]
impl ListingProvider for RedfinClient {
    async fn fetch(&self, region: &RegionId, params: &QueryParams) -> Result<Vec<Value>> {
        let query = gis_query(region, params);
        let data = self.get_json("/stingray/api/gis", &query).await?;

        match data.get("payload").and_then(|p| p.get("homes")).and_then(Value::as_array) {
            Some(homes) => {
                info!("Found {} homes in API response", homes.len());
                Ok(homes.clone())
            }
            None => {
                let keys: Vec<&str> = data
                    .as_object()
                    .map(|o| o.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                warn!(response_keys = ?keys, "No homes found in API response");
                Ok(Vec::new())
            }
        }
    }

    fn parse_record(&self, raw: &Value) -> Result<ListingRecord> {
        parse_home(raw, &self.base_url)
    }

    fn source_name(&self) -> &'static str {
        "Redfin"
    }
}

#[async_trait]
impl PageFetcher for RedfinClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        self.get_text(url.clone(), &[]).await
    }
}

pub fn strip_hijack_prefix(text: &str) -> &str {
    text.strip_prefix(JSON_HIJACK_PREFIX).unwrap_or(text)
}

/// Query string for the GIS endpoint
pub fn gis_query(region: &RegionId, params: &QueryParams) -> Vec<(&'static str, String)> {
    let uipt: Vec<&str> = params
        .property_types
        .iter()
        .filter_map(|t| {
            let code = property_type_code(t);
            if code.is_none() {
                debug!(property_type = %t, "no Redfin code for property type");
            }
            code
        })
        .collect();

    let mut query = vec![
        ("al", "1".to_string()),
        ("region_id", region.to_string()),
        ("region_type", CITY_REGION_TYPE.to_string()),
        ("min_price", params.min_price.to_string()),
        ("max_price", params.max_price.to_string()),
        ("min_beds", params.min_beds.to_string()),
        ("max_beds", params.max_beds.to_string()),
        ("min_baths", params.min_baths.to_string()),
        ("max_baths", params.max_baths.to_string()),
        ("num_homes", params.page_size.to_string()),
        ("page_number", (params.page + 1).to_string()),
    ];
    if !uipt.is_empty() {
        query.push(("uipt", uipt.join(",")));
    }
    query
}

fn property_type_code(tag: &str) -> Option<&'static str> {
    match tag {
        "house" => Some("1"),
        "condo" => Some("2"),
        "townhouse" => Some("3"),
        "multi-family" => Some("4"),
        "land" => Some("5"),
        "other" => Some("6"),
        _ => None,
    }
}

fn property_type_name(code: u64) -> &'static str {
    match code {
        6 => "house",
        3 => "condo",
        13 => "townhouse",
        4 => "multi-family",
        5 => "land",
        _ => "other",
    }
}

/// Map one GIS `homes[]` entry into a listing.
pub fn parse_home(home: &Value, base_url: &Url) -> Result<ListingRecord> {
    let address = boxed(home, "streetLine")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ScoutError::MalformedRecord("home has no streetLine".into()))?;
    let price = boxed(home, "price")
        .and_then(Value::as_u64)
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no usable price for {address}")))?;

    let lat_long = home
        .get("latLong")
        .map(|ll| ll.get("value").unwrap_or(ll))
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no latLong for {address}")))?;
    let latitude = lat_long
        .get("latitude")
        .and_then(Value::as_f64)
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no latitude for {address}")))?;
    let longitude = lat_long
        .get("longitude")
        .and_then(Value::as_f64)
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no longitude for {address}")))?;

    let beds = home.get("beds").and_then(Value::as_f64).unwrap_or(0.0);
    let baths = home.get("baths").and_then(Value::as_f64).unwrap_or(0.0);
    if beds < 0.0 {
        return Err(ScoutError::MalformedRecord(format!("negative beds for {address}")));
    }

    let sqft = boxed(home, "sqFt").and_then(Value::as_u64).map(|v| v as u32);
    let lot_size = boxed(home, "lotSize")
        .and_then(Value::as_f64)
        .map(|sqft| (sqft / SQFT_PER_ACRE * 100.0).round() / 100.0);
    let year_built = boxed(home, "yearBuilt").and_then(Value::as_i64).map(|y| y as i32);
    let property_type = match home.get("propertyType") {
        Some(Value::Number(n)) => n.as_u64().map(property_type_name).unwrap_or("other").to_string(),
        Some(Value::String(s)) => s.to_lowercase(),
        _ => String::new(),
    };
    let url = home
        .get("url")
        .and_then(Value::as_str)
        .and_then(|path| base_url.join(path).ok())
        .map(String::from)
        .unwrap_or_default();

    let listing = ListingRecord::new(address.trim(), price, Coordinate::new(latitude, longitude))
        .with_rooms(beds as u32, baths)
        .with_details(sqft, lot_size, year_built)
        .with_property_type(property_type)
        .with_url(url);
    let listing = match boxed(home, "mlsId").and_then(Value::as_str) {
        Some(mls) => listing.with_id(mls),
        None => listing,
    };
    validate_listing(listing)
}

/// Redfin wraps most scalar fields as `{"value": …}`; plain values are accepted too.
fn boxed<'a>(home: &'a Value, key: &str) -> Option<&'a Value> {
    let field = home.get(key)?;
    match field.get("value") {
        Some(inner) => Some(inner),
        None if field.is_object() => None,
        None => Some(field),
    }
}
