//! Redfin adapter contract tests
//!
//! These tests pin the HTTP shape the Redfin client relies on:
//! - location search: `{}&&`-prefixed JSON, city rows before `exactMatch`
//! - GIS listing endpoint: query parameters and `payload.homes` mapping
//! - search page fallback: JSON-LD listings on the city filter page
//! - error statuses mapped to recoverable provider failures

use property_scout::scrapers::RedfinClient;
use property_scout::search::{QueryParams, RegionId};
use property_scout::{
    Collaborators, ListingProvider, LocationResolver, PipelineConfig, PropertyScout, ScoutError,
    SearchCriteria, StrategyKind,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOCATION_PATH: &str = "/stingray/api/location/search";
const GIS_PATH: &str = "/stingray/api/gis";

fn client(server: &MockServer) -> RedfinClient {
    RedfinClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn hijacked(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!("{{}}&&{body}"))
}

fn criteria() -> SearchCriteria {
    SearchCriteria::builder("Austin", "TX")
        .price(300_000, 800_000)
        .beds(2, 4)
        .baths(2.0, 3.0)
        .property_types(["house"])
        .build()
        .unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig {
        request_delay_ms: 0,
        synthetic_seed: Some(3),
        ..PipelineConfig::default()
    }
}

fn home(street: &str, price: u64, lat: f64, lon: f64) -> Value {
    json!({
        "mlsId": { "value": format!("MLS-{price}") },
        "price": { "value": price },
        "sqFt": { "value": 1900 },
        "beds": 3,
        "baths": 2.0,
        "propertyType": 6,
        "streetLine": { "value": street },
        "latLong": { "value": { "latitude": lat, "longitude": lon } },
        "url": format!("/TX/Austin/{}/home/1", street.replace(' ', "-"))
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Location search
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_location_search_strips_prefix_and_takes_first_city_row() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .and(query_param("location", "Austin, TX"))
        .and(query_param("v", "2"))
        .respond_with(hijacked(json!({
            "payload": {
                "sections": [
                    { "rows": [{ "type": "zip", "id": { "tableId": 1 } }] },
                    { "rows": [
                        { "type": "city", "id": { "tableId": 30818 } },
                        { "type": "city", "id": { "tableId": 99999 } }
                    ] }
                ],
                "exactMatch": { "id": { "tableId": 55555 } }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let region = client(&server).resolve_region("Austin", "TX").await.unwrap();
    assert_eq!(region, Some(RegionId("30818".into())));
}

#[tokio::test]
async fn test_location_search_falls_back_to_exact_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(hijacked(json!({
            "payload": {
                "sections": [{ "rows": [{ "type": "school", "id": { "tableId": 7 } }] }],
                "exactMatch": { "id": { "tableId": "30818" } }
            }
        })))
        .mount(&server)
        .await;

    let region = client(&server).resolve_region("Austin", "TX").await.unwrap();
    assert_eq!(region, Some(RegionId("30818".into())));
}

#[tokio::test]
async fn test_location_search_without_match_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(hijacked(json!({ "payload": { "sections": [] } })))
        .mount(&server)
        .await;

    let region = client(&server).resolve_region("Nowhere", "ZZ").await.unwrap();
    assert_eq!(region, None);
}

#[tokio::test]
async fn test_server_error_is_recoverable_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).resolve_region("Austin", "TX").await.unwrap_err();
    assert!(matches!(err, ScoutError::Provider(_)), "got {err:?}");
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_garbage_body_is_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let err = client(&server).resolve_region("Austin", "TX").await.unwrap_err();
    assert!(matches!(err, ScoutError::Provider(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// GIS listings
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_gis_request_carries_criteria_and_paging() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(GIS_PATH))
        .and(query_param("al", "1"))
        .and(query_param("region_id", "30818"))
        .and(query_param("region_type", "6"))
        .and(query_param("min_price", "300000"))
        .and(query_param("max_price", "800000"))
        .and(query_param("min_beds", "2"))
        .and(query_param("max_beds", "4"))
        .and(query_param("num_homes", "350"))
        .and(query_param("page_number", "2"))
        .and(query_param("uipt", "1"))
        .respond_with(hijacked(json!({
            "payload": { "homes": [home("12 Elm St", 525_000, 30.27, -97.74)] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = QueryParams::from_criteria(&criteria(), 350).for_page(1);
    let raw = client(&server)
        .fetch(&RegionId("30818".into()), &params)
        .await
        .unwrap();
    assert_eq!(raw.len(), 1);
}

#[tokio::test]
async fn test_gis_homes_are_mapped_to_listings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(GIS_PATH))
        .respond_with(hijacked(json!({
            "payload": { "homes": [home("12 Elm St", 525_000, 30.27, -97.74)] }
        })))
        .mount(&server)
        .await;

    let redfin = client(&server);
    let params = QueryParams::from_criteria(&criteria(), 350);
    let raw = redfin.fetch(&RegionId("30818".into()), &params).await.unwrap();
    let listing = redfin.parse_record(&raw[0]).unwrap();

    assert_eq!(listing.address, "12 Elm St");
    assert_eq!(listing.price, 525_000);
    assert_eq!(listing.property_type, "house");
    assert_eq!(listing.id.as_deref(), Some("MLS-525000"));
    assert!(listing.url.starts_with(&server.uri()));
    assert!(!listing.is_synthetic());
}

#[tokio::test]
async fn test_gis_without_homes_is_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(GIS_PATH))
        .respond_with(hijacked(json!({ "errorMessage": "Success", "payload": {} })))
        .mount(&server)
        .await;

    let params = QueryParams::from_criteria(&criteria(), 350);
    let raw = client(&server)
        .fetch(&RegionId("30818".into()), &params)
        .await
        .unwrap();
    assert!(raw.is_empty());
}

// ────────────────────────────────────────────────────────────────────────────
// Full pipeline against the mock server
// ────────────────────────────────────────────────────────────────────────────

async fn mount_region(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(hijacked(json!({
            "payload": {
                "sections": [{ "rows": [{ "type": "city", "id": { "tableId": 30818 } }] }]
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pipeline_ranks_live_region_listings() {
    let server = MockServer::start().await;
    mount_region(&server).await;
    Mock::given(method("GET"))
        .and(path(GIS_PATH))
        .respond_with(hijacked(json!({
            "payload": { "homes": [
                home("12 Elm St", 525_000, 30.27, -97.74),
                home("40 Oak Ave", 610_000, 30.31, -97.70),
                { "streetLine": { "value": "no price" } }
            ] }
        })))
        .mount(&server)
        .await;

    let collaborators = Collaborators::redfin(client(&server), Some(11));
    let scout = PropertyScout::new(config(), collaborators).unwrap();
    let report = scout.run(&criteria()).await.unwrap();

    assert_eq!(report.strategy(), Some(StrategyKind::RegionApi));
    assert!(!report.is_synthetic());
    assert_eq!(report.len(), 2);
    assert!(report.listings().iter().all(|l| l.is_enriched()));
    let scores: Vec<f64> = report.listings().iter().filter_map(|l| l.overall_score()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_pipeline_falls_back_to_search_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATION_PATH))
        .respond_with(hijacked(json!({ "payload": { "sections": [] } })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/city/austin/TX/filter"))
        .and(query_param("min-price", "300000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head>
            <script type="application/ld+json">
            {"@type": "SingleFamilyResidence", "name": "7 Pine Rd",
             "url": "/TX/Austin/7-Pine-Rd/home/2",
             "geo": {"latitude": 30.25, "longitude": -97.76},
             "numberOfBedrooms": 3, "numberOfBathroomsTotal": 2,
             "offers": {"price": 455000}}
            </script></head></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let collaborators = Collaborators::redfin(client(&server), Some(5));
    let scout = PropertyScout::new(config(), collaborators).unwrap();
    let report = scout.run(&criteria()).await.unwrap();

    assert_eq!(report.strategy(), Some(StrategyKind::UrlPattern));
    assert_eq!(report.len(), 1);
    assert_eq!(report.listings()[0].address, "7 Pine Rd");
    assert_eq!(report.listings()[0].price, 455_000);
}

#[tokio::test]
async fn test_pipeline_uses_synthetic_data_when_site_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let collaborators = Collaborators::redfin(client(&server), Some(5));
    let scout = PropertyScout::new(config(), collaborators).unwrap();
    let report = scout.run(&criteria()).await.unwrap();

    assert!(report.is_synthetic());
    assert_eq!(report.strategy(), None);
    assert_eq!(report.len(), 10);
    assert!(report.listings().iter().all(|l| l.is_synthetic() && l.is_enriched()));
}
