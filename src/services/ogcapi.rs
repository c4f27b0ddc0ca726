//! OGC-API-Features collection harvesting
//!
//! Unlike the XML services, OGC API endpoints are interrogated through
//! their JSON `/collections` document.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CapabilityProbe, HarvestError};
use crate::models::{Capabilities, OgcApiCapabilities, ServiceKind};

#[derive(Debug, Deserialize)]
struct CollectionsDoc {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    id: String,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    crs: Vec<String>,
    extent: Option<Extent>,
}

#[derive(Debug, Deserialize)]
struct Extent {
    spatial: Option<SpatialExtent>,
}

#[derive(Debug, Deserialize)]
struct SpatialExtent {
    #[serde(default)]
    bbox: Vec<Vec<f64>>,
}

/// Split a landing-page or collection URL into the API base and, when the
/// URL points at a specific collection, that collection's id
fn split_collection_url(url: &str) -> (String, Option<String>) {
    match url.split_once("collections/") {
        Some((base, rest)) => {
            let id = rest
                .split(['/', '?', '#'])
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            (base.trim_end_matches('/').to_string(), id)
        }
        None => (url.trim_end_matches('/').to_string(), None),
    }
}

fn select_collection<'a>(
    collections: &'a [CollectionEntry],
    hint: Option<&str>,
) -> Option<&'a CollectionEntry> {
    if collections.len() == 1 {
        return Some(&collections[0]);
    }
    let hint = hint?;
    collections
        .iter()
        .find(|c| c.id == hint)
        .or_else(|| {
            collections.iter().find(|c| {
                c.title
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(hint))
            })
        })
}

pub(crate) struct OgcApiProbe;

#[async_trait]
impl CapabilityProbe for OgcApiProbe {
    fn kind(&self) -> ServiceKind {
        ServiceKind::OgcApi
    }

    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        _record_id: Option<&str>,
    ) -> Result<Capabilities, HarvestError> {
        let (base, url_hint) = split_collection_url(url);
        let hint = layer_hint.or(url_hint.as_deref());

        let collections_url = format!("{base}/collections?f=json");
        let doc: CollectionsDoc = client
            .get(&collections_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if doc.collections.is_empty() {
            return Err(HarvestError::Invalid(
                "collections document lists no collections".into(),
            ));
        }

        let layer_all: Vec<String> = doc.collections.iter().map(|c| c.id.clone()).collect();
        let matched = select_collection(&doc.collections, hint);

        Ok(Capabilities::OgcApi(OgcApiCapabilities {
            layer_name: matched.map(|c| c.id.clone()),
            title: matched.and_then(|c| c.title.clone()),
            abstract_: matched.and_then(|c| c.description.clone()),
            bbox: matched.and_then(|c| {
                c.extent
                    .as_ref()
                    .and_then(|e| e.spatial.as_ref())
                    .and_then(|s| s.bbox.first().cloned())
            }),
            crs: matched.map(|c| c.crs.clone()).unwrap_or_default(),
            layer_all,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_collection_url() {
        let (base, id) =
            split_collection_url("https://api.example.org/ogcapi/collections/soil/items");
        assert_eq!(base, "https://api.example.org/ogcapi");
        assert_eq!(id.as_deref(), Some("soil"));

        let (base, id) = split_collection_url("https://api.example.org/ogcapi/collections/soil?f=json");
        assert_eq!(base, "https://api.example.org/ogcapi");
        assert_eq!(id.as_deref(), Some("soil"));

        let (base, id) = split_collection_url("https://api.example.org/ogcapi");
        assert_eq!(base, "https://api.example.org/ogcapi");
        assert!(id.is_none());
    }

    fn sample() -> Vec<CollectionEntry> {
        serde_json::from_str(
            r#"[
                {"id": "soil", "title": "Soil data", "crs": ["EPSG:4326"],
                 "extent": {"spatial": {"bbox": [[-10, 35, 30, 70]]}}},
                {"id": "water", "title": "Water data"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_collection_selection_by_id_then_title() {
        let collections = sample();
        assert_eq!(
            select_collection(&collections, Some("water")).unwrap().id,
            "water"
        );
        assert_eq!(
            select_collection(&collections, Some("SOIL DATA")).unwrap().id,
            "soil"
        );
        assert!(select_collection(&collections, Some("air")).is_none());
        assert!(select_collection(&collections, None).is_none());
    }

    #[test]
    fn test_single_collection_matches_without_hint() {
        let collections: Vec<CollectionEntry> =
            serde_json::from_str(r#"[{"id": "only"}]"#).unwrap();
        assert_eq!(select_collection(&collections, None).unwrap().id, "only");
    }
}
