//! Common test utilities and fixtures

use linkhawk::config::{CatalogueConfig, CheckerConfig};
use linkhawk::models::DeprecationPolicy;

/// Checker configuration pointing nowhere in particular, short timeout
#[allow(dead_code)]
pub fn checker_config() -> CheckerConfig {
    CheckerConfig {
        workers: 4,
        timeout_secs: 5,
        user_agent: String::from("linkhawk-test/0"),
        max_failures: 10,
        deprecation_policy: DeprecationPolicy::SelfHealing,
    }
}

/// Catalogue configuration against a mock server base URL
#[allow(dead_code)]
pub fn catalogue_config(base_url: &str) -> CatalogueConfig {
    CatalogueConfig {
        base_url: base_url.to_string(),
        collection: String::from("metadata:main"),
    }
}

/// One items page with `numberMatched`/`numberReturned` and features
#[allow(dead_code)]
pub fn items_page(matched: u64, returned: u64, features: &[(&str, &str)]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = features
        .iter()
        .map(|(id, href)| {
            serde_json::json!({
                "id": id,
                "links": [
                    {"href": format!("https://cat.example.org/items/{id}"), "rel": "self"},
                    {"href": href, "rel": "enclosure"}
                ]
            })
        })
        .collect();
    serde_json::json!({
        "numberMatched": matched,
        "numberReturned": returned,
        "features": features
    })
}

/// WMS GetCapabilities document with two named layers; layer "alpha" is
/// titled "beta" to exercise name-over-title matching
#[allow(dead_code)]
pub const WMS_CAPABILITIES: &str = r#"<?xml version="1.0"?>
<WMS_Capabilities version="1.3.0" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>Test map server</Title>
  </Service>
  <Capability>
    <Layer>
      <Title>All layers</Title>
      <CRS>EPSG:4326</CRS>
      <Layer queryable="1">
        <Name>alpha</Name>
        <Title>beta</Title>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>-10</westBoundLongitude>
          <eastBoundLongitude>30</eastBoundLongitude>
          <southBoundLatitude>35</southBoundLatitude>
          <northBoundLatitude>70</northBoundLatitude>
        </EX_GeographicBoundingBox>
      </Layer>
      <Layer>
        <Name>beta</Name>
        <Title>Vegetation</Title>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

/// OGC-API-Features `/collections` document with two collections
#[allow(dead_code)]
pub fn collections_doc() -> serde_json::Value {
    serde_json::json!({
        "collections": [
            {
                "id": "soil",
                "title": "Soil data",
                "description": "Observed soil properties",
                "crs": ["http://www.opengis.net/def/crs/OGC/1.3/CRS84"],
                "extent": {"spatial": {"bbox": [[-10.0, 35.0, 30.0, 70.0]]}}
            },
            {"id": "water", "title": "Water data"}
        ]
    })
}
