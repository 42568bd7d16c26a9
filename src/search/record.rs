//! Region identifiers and record-level mapping into [`ListingRecord`].

use crate::error::{Result, ScoutError};
use crate::models::{Coordinate, ListingRecord, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Provider-specific identifier for a city region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pick the region out of a location-search payload.
///
/// Scans `payload.sections[*].rows[*]` in order and takes the first row
/// whose `type` is `"city"` and that carries an `id.tableId`. Without one,
/// falls back to `payload.exactMatch.id.tableId`. `tableId` may be a number
/// or a string.
pub fn resolve_region_id(response: &Value) -> Option<RegionId> {
    let payload = response.get("payload")?;

    let city_row = payload
        .get("sections")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|section| section.get("rows").and_then(Value::as_array))
        .flatten()
        .filter(|row| row.get("type").and_then(Value::as_str) == Some("city"))
        .find_map(table_id);
    if city_row.is_some() {
        return city_row;
    }

    payload.get("exactMatch").and_then(table_id)
}

fn table_id(entry: &Value) -> Option<RegionId> {
    match entry.get("id")?.get("tableId")? {
        Value::String(s) if !s.trim().is_empty() => Some(RegionId(s.trim().to_string())),
        Value::Number(n) => Some(RegionId(n.to_string())),
        _ => None,
    }
}

/// Flat listing schema accepted by [`ListingProvider::parse_record`]'s default.
///
/// [`ListingProvider::parse_record`]: super::ListingProvider::parse_record
#[derive(Debug, Clone, Deserialize)]
pub struct RawListing {
    pub address: String,
    pub price: u64,
    #[serde(default)]
    pub beds: u32,
    #[serde(default)]
    pub baths: f64,
    pub sqft: Option<u32>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    #[serde(default)]
    pub property_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub url: String,
    pub id: Option<String>,
}

impl TryFrom<RawListing> for ListingRecord {
    type Error = ScoutError;

    fn try_from(raw: RawListing) -> Result<Self> {
        let location = Coordinate::new(raw.latitude, raw.longitude);
        let listing = ListingRecord::new(raw.address, raw.price, location)
            .with_rooms(raw.beds, raw.baths)
            .with_details(raw.sqft, raw.lot_size, raw.year_built)
            .with_property_type(raw.property_type)
            .with_url(raw.url);
        let listing = match raw.id {
            Some(id) => listing.with_id(id),
            None => listing,
        };
        validate_listing(listing)
    }
}

pub fn parse_generic_record(raw: &Value) -> Result<ListingRecord> {
    let parsed: RawListing = serde_json::from_value(raw.clone())
        .map_err(|e| ScoutError::MalformedRecord(e.to_string()))?;
    ListingRecord::try_from(parsed)
}

/// Checks invariants every parsed listing must meet before entering the
/// pipeline.
pub fn validate_listing(listing: ListingRecord) -> Result<ListingRecord> {
    if listing.address.trim().is_empty() {
        return Err(ScoutError::MalformedRecord("listing has no address".into()));
    }
    if !listing.location.is_valid() {
        return Err(ScoutError::MalformedRecord(format!(
            "invalid coordinates for {}: {}",
            listing.address, listing.location
        )));
    }
    if !listing.baths.is_finite() || listing.baths < 0.0 {
        return Err(ScoutError::MalformedRecord(format!(
            "invalid bath count for {}",
            listing.address
        )));
    }
    if listing.lot_size.is_some_and(|lot| !lot.is_finite() || lot < 0.0) {
        return Err(ScoutError::MalformedRecord(format!(
            "invalid lot size for {}",
            listing.address
        )));
    }
    if listing.source == Source::Synthetic {
        return Err(ScoutError::MalformedRecord(
            "provider records cannot be synthetic".into(),
        ));
    }
    Ok(listing)
}
