//! WCS capability harvesting (GetCapabilities 2.0.1)

use async_trait::async_trait;
use reqwest::Client;
use roxmltree::{Document, Node};

use super::matching::{select_layer, LayerLike};
use super::xml;
use super::{fetch_text, kvp_request_url, CapabilityProbe, HarvestError};
use crate::models::{Capabilities, ServiceKind, WcsCapabilities};

#[derive(Debug)]
struct WcsCoverage {
    name: String,
    title: Option<String>,
    abstract_: Option<String>,
    keywords: Vec<String>,
    bbox: Option<[f64; 4]>,
    metadata_urls: Vec<String>,
}

impl LayerLike for WcsCoverage {
    fn name(&self) -> &str {
        &self.name
    }
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
    fn metadata_urls(&self) -> &[String] {
        &self.metadata_urls
    }
}

fn parse_coverage(node: Node<'_, '_>) -> Option<WcsCoverage> {
    let keywords = xml::child(node, "Keywords")
        .map(|kw| {
            xml::children(kw, "Keyword")
                .into_iter()
                .filter_map(|k| k.text())
                .map(|t| t.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(WcsCoverage {
        name: xml::child_text(node, "CoverageId")?,
        title: xml::child_text(node, "Title"),
        abstract_: xml::child_text(node, "Abstract"),
        keywords,
        bbox: xml::wgs84_bbox(node),
        metadata_urls: xml::metadata_hrefs(node, "Metadata"),
    })
}

pub(crate) struct WcsProbe;

#[async_trait]
impl CapabilityProbe for WcsProbe {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Wcs
    }

    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> Result<Capabilities, HarvestError> {
        let request_url = kvp_request_url(url, "WCS", "GetCapabilities", Some("2.0.1"), &[])?;
        let text = fetch_text(client, &request_url).await?;
        let doc = Document::parse(&text)?;
        let root = doc.root_element();

        let contents = xml::child(root, "Contents").ok_or_else(|| {
            HarvestError::Invalid("not a WCS capabilities document (no Contents)".into())
        })?;

        let coverages: Vec<WcsCoverage> = xml::children(contents, "CoverageSummary")
            .into_iter()
            .filter_map(parse_coverage)
            .collect();

        let supported_formats: Vec<String> = xml::child(root, "ServiceMetadata")
            .map(|sm| {
                xml::children(sm, "formatSupported")
                    .into_iter()
                    .filter_map(|f| f.text())
                    .map(|t| t.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let layer_all: Vec<String> = coverages.iter().map(|c| c.name.clone()).collect();
        let matched = select_layer(&coverages, layer_hint, record_id);

        Ok(Capabilities::Wcs(WcsCapabilities {
            layer_name: matched.map(|c| c.name.clone()),
            title: matched.and_then(|c| c.title.clone()),
            abstract_: matched.and_then(|c| c.abstract_.clone()),
            keywords: matched.map(|c| c.keywords.clone()).unwrap_or_default(),
            bbox: matched.and_then(|c| c.bbox),
            metadata_urls: matched
                .map(|c| c.metadata_urls.clone())
                .unwrap_or_default(),
            layer_all,
            supported_formats,
        }))
    }
}
