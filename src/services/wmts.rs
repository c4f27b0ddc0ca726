//! WMTS capability harvesting (GetCapabilities 1.0.0)

use async_trait::async_trait;
use reqwest::Client;
use roxmltree::{Document, Node};

use super::matching::{select_layer, LayerLike};
use super::xml;
use super::{fetch_text, kvp_request_url, CapabilityProbe, HarvestError};
use crate::models::{Capabilities, ServiceKind, WmtsCapabilities};

#[derive(Debug)]
struct WmtsLayer {
    name: String,
    title: Option<String>,
    abstract_: Option<String>,
    bbox: Option<[f64; 4]>,
    formats: Vec<String>,
    tilematrixsets: Vec<String>,
    metadata_urls: Vec<String>,
}

impl LayerLike for WmtsLayer {
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

fn parse_layer(node: Node<'_, '_>) -> Option<WmtsLayer> {
    Some(WmtsLayer {
        name: xml::child_text(node, "Identifier")?,
        title: xml::child_text(node, "Title"),
        abstract_: xml::child_text(node, "Abstract"),
        bbox: xml::wgs84_bbox(node),
        formats: xml::children(node, "Format")
            .into_iter()
            .filter_map(|f| f.text())
            .map(|t| t.trim().to_string())
            .collect(),
        tilematrixsets: xml::children(node, "TileMatrixSetLink")
            .into_iter()
            .filter_map(|l| xml::child_text(l, "TileMatrixSet"))
            .collect(),
        metadata_urls: xml::metadata_hrefs(node, "Metadata"),
    })
}

pub(crate) struct WmtsProbe;

#[async_trait]
impl CapabilityProbe for WmtsProbe {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Wmts
    }

    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> Result<Capabilities, HarvestError> {
        let request_url = kvp_request_url(url, "WMTS", "GetCapabilities", Some("1.0.0"), &[])?;
        let text = fetch_text(client, &request_url).await?;
        let doc = Document::parse(&text)?;
        let root = doc.root_element();

        let contents = xml::child(root, "Contents").ok_or_else(|| {
            HarvestError::Invalid("not a WMTS capabilities document (no Contents)".into())
        })?;

        let layers: Vec<WmtsLayer> = xml::children(contents, "Layer")
            .into_iter()
            .filter_map(parse_layer)
            .collect();

        let layer_all: Vec<String> = layers.iter().map(|l| l.name.clone()).collect();
        let matched = select_layer(&layers, layer_hint, record_id);

        Ok(Capabilities::Wmts(WmtsCapabilities {
            layer_name: matched.map(|l| l.name.clone()),
            title: matched.and_then(|l| l.title.clone()),
            abstract_: matched.and_then(|l| l.abstract_.clone()),
            bbox: matched.and_then(|l| l.bbox),
            formats: matched.map(|l| l.formats.clone()).unwrap_or_default(),
            tilematrixsets: matched
                .map(|l| l.tilematrixsets.clone())
                .unwrap_or_default(),
            metadata_urls: matched
                .map(|l| l.metadata_urls.clone())
                .unwrap_or_default(),
            layer_all,
        }))
    }
}
