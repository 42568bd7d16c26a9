//! Listings embedded in search pages as schema.org JSON-LD.
//!
//! Search result pages carry one `<script type="application/ld+json">`
//! block per home. Some sites put the residence (address, geo, rooms) and
//! its offer (price) in separate objects sharing a `url`; those are joined
//! before parsing.

use crate::error::{Result, ScoutError};
use crate::models::{Coordinate, ListingRecord};
use crate::search::record::validate_listing;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

const RESIDENCE_TYPES: [&str; 6] = [
    "SingleFamilyResidence",
    "House",
    "Residence",
    "Apartment",
    "Accommodation",
    "Place",
];

/// Raw residence objects found in the page, with offers merged in.
pub fn extract_listing_records(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(selector) => selector,
        Err(err) => {
            warn!("invalid JSON-LD selector: {err}");
            return Vec::new();
        }
    };

    let mut objects = Vec::new();
    for (idx, script) in document.select(&selector).enumerate() {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => flatten_into(value, &mut objects),
            Err(err) => debug!(block = idx, error = %err, "skipping unparsable JSON-LD block"),
        }
    }

    let mut offers_by_url: HashMap<String, Value> = HashMap::new();
    for object in &objects {
        if !is_residence(object) {
            if let (Some(url), Some(offers)) = (string_field(object, "url"), object.get("offers")) {
                offers_by_url.insert(url, offers.clone());
            }
        }
    }

    objects
        .into_iter()
        .filter(is_residence)
        .map(|mut residence| {
            if residence.get("offers").is_none() {
                let offers =
                    string_field(&residence, "url").and_then(|url| offers_by_url.get(&url));
                if let (Some(offers), Some(map)) = (offers.cloned(), residence.as_object_mut()) {
                    map.insert("offers".into(), offers);
                }
            }
            residence
        })
        .collect()
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_into(item, out)),
        Value::Object(mut map) => match map.remove("@graph") {
            Some(graph) => flatten_into(graph, out),
            None => out.push(Value::Object(map)),
        },
        _ => {}
    }
}

fn is_residence(value: &Value) -> bool {
    let typed = match value.get("@type") {
        Some(Value::String(t)) => RESIDENCE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| RESIDENCE_TYPES.contains(&t)),
        _ => false,
    };
    typed && value.get("geo").is_some()
}

/// Map one JSON-LD residence into a listing.
pub fn parse_listing_record(raw: &Value, base: &Url) -> Result<ListingRecord> {
    let object = raw
        .as_object()
        .ok_or_else(|| ScoutError::MalformedRecord("JSON-LD listing is not an object".into()))?;

    let address = address_of(object)
        .ok_or_else(|| ScoutError::MalformedRecord("JSON-LD listing has no address".into()))?;
    let price = price_of(object).ok_or_else(|| {
        ScoutError::MalformedRecord(format!("no usable offer price for {address}"))
    })?;
    let geo = object
        .get("geo")
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no geo for {address}")))?;
    let latitude = number(geo.get("latitude"))
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no latitude for {address}")))?;
    let longitude = number(geo.get("longitude"))
        .ok_or_else(|| ScoutError::MalformedRecord(format!("no longitude for {address}")))?;

    let beds = number(object.get("numberOfBedrooms"))
        .or_else(|| number(object.get("numberOfRooms")))
        .unwrap_or(0.0);
    let baths = number(object.get("numberOfBathroomsTotal"))
        .or_else(|| number(object.get("numberOfFullBathrooms")))
        .unwrap_or(0.0);
    let sqft = object
        .get("floorSize")
        .and_then(|size| number(size.get("value")))
        .map(|v| v.round() as u32);
    let year_built = number(object.get("yearBuilt")).map(|y| y as i32);
    let url = string_field(raw, "url")
        .and_then(|href| base.join(&href).ok())
        .map(String::from)
        .unwrap_or_default();

    let listing = ListingRecord::new(address, price, Coordinate::new(latitude, longitude))
        .with_rooms(beds.max(0.0) as u32, baths)
        .with_details(sqft, None, year_built)
        .with_property_type(property_type_of(raw))
        .with_url(url);
    let listing = match string_field(raw, "identifier") {
        Some(id) => listing.with_id(id),
        None => listing,
    };
    validate_listing(listing)
}

fn address_of(object: &Map<String, Value>) -> Option<String> {
    match object.get("address") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Object(parts)) => {
            let joined: Vec<&str> = ["streetAddress", "addressLocality", "addressRegion"]
                .iter()
                .filter_map(|k| parts.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!joined.is_empty()).then(|| joined.join(", "))
        }
        _ => object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    }
}

fn price_of(object: &Map<String, Value>) -> Option<u64> {
    let offers = object.get("offers")?;
    let offer = match offers {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let price = number(offer.get("price"))?;
    (price >= 0.0).then(|| price.round() as u64)
}

fn property_type_of(raw: &Value) -> &'static str {
    let types: Vec<&str> = match raw.get("@type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    if types.iter().any(|t| *t == "SingleFamilyResidence" || *t == "House") {
        "house"
    } else if types.contains(&"Apartment") {
        "condo"
    } else {
        "other"
    }
}

/// Numbers, or strings like "$610,000"
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.redfin.com").unwrap()
    }

    const SPLIT_PAGE: &str = r#"
        <html><head>
        <script type="application/ld+json">
        [
          {"@context": "http://schema.org", "@type": "SingleFamilyResidence",
           "url": "/TX/Austin/12-Elm-St-78701/home/111",
           "address": {"@type": "PostalAddress", "streetAddress": "12 Elm St",
                       "addressLocality": "Austin", "addressRegion": "TX"},
           "geo": {"@type": "GeoCoordinates", "latitude": 30.27, "longitude": -97.74},
           "numberOfRooms": 3, "floorSize": {"value": "1,850"}},
          {"@context": "http://schema.org", "@type": "Product",
           "url": "/TX/Austin/12-Elm-St-78701/home/111",
           "offers": {"@type": "Offer", "price": "$525,000", "priceCurrency": "USD"}}
        ]
        </script>
        <script type="application/ld+json">{ not json </script>
        <script type="application/ld+json">
          {"@graph": [{"@type": "Apartment", "name": "5 Lake Dr #2",
                       "geo": {"latitude": "30.30", "longitude": "-97.70"},
                       "numberOfBedrooms": 2, "numberOfBathroomsTotal": 1.5,
                       "offers": [{"price": 310000}]}]}
        </script>
        <script type="application/ld+json">{"@type": "Organization", "name": "Redfin"}</script>
        </head></html>"#;

    #[test]
    fn extracts_residences_and_joins_offers() {
        let records = extract_listing_records(SPLIT_PAGE);
        assert_eq!(records.len(), 2);

        let first = parse_listing_record(&records[0], &base()).unwrap();
        assert_eq!(first.address, "12 Elm St, Austin, TX");
        assert_eq!(first.price, 525_000);
        assert_eq!(first.beds, 3);
        assert_eq!(first.sqft, Some(1850));
        assert_eq!(first.property_type, "house");
        assert_eq!(
            first.url,
            "https://www.redfin.com/TX/Austin/12-Elm-St-78701/home/111"
        );

        let second = parse_listing_record(&records[1], &base()).unwrap();
        assert_eq!(second.address, "5 Lake Dr #2");
        assert_eq!(second.price, 310_000);
        assert_eq!(second.baths, 1.5);
        assert_eq!(second.property_type, "condo");
        assert_eq!(second.location, Coordinate::new(30.30, -97.70));
    }

    #[test]
    fn residence_without_price_is_malformed() {
        let raw = serde_json::json!({
            "@type": "House",
            "name": "1 Nowhere Ln",
            "geo": {"latitude": 30.0, "longitude": -97.0}
        });
        let err = parse_listing_record(&raw, &base()).unwrap_err();
        assert!(matches!(err, ScoutError::MalformedRecord(_)));
    }

    #[test]
    fn page_without_json_ld_yields_nothing() {
        assert!(extract_listing_records("<html><body>No homes</body></html>").is_empty());
    }
}
