//! WMS capability harvesting (GetCapabilities 1.3.0)

use async_trait::async_trait;
use reqwest::Client;
use roxmltree::{Document, Node};

use super::matching::{select_layer, LayerLike};
use super::xml;
use super::{fetch_text, kvp_request_url, CapabilityProbe, HarvestError};
use crate::models::{Capabilities, ServiceKind, WmsCapabilities};

#[derive(Debug)]
struct WmsLayer {
    name: String,
    title: Option<String>,
    abstract_: Option<String>,
    keywords: Vec<String>,
    crs: Vec<String>,
    bbox: Option<[f64; 4]>,
    styles: Vec<String>,
    metadata_urls: Vec<String>,
    queryable: bool,
}

impl LayerLike for WmsLayer {
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

fn parse_geographic_bbox(layer: Node<'_, '_>) -> Option<[f64; 4]> {
    let bbox = xml::child(layer, "EX_GeographicBoundingBox")?;
    let west: f64 = xml::child_text(bbox, "westBoundLongitude")?.parse().ok()?;
    let east: f64 = xml::child_text(bbox, "eastBoundLongitude")?.parse().ok()?;
    let south: f64 = xml::child_text(bbox, "southBoundLatitude")?.parse().ok()?;
    let north: f64 = xml::child_text(bbox, "northBoundLatitude")?.parse().ok()?;
    Some([west, south, east, north])
}

fn parse_layer(node: Node<'_, '_>) -> Option<WmsLayer> {
    // Only named layers are requestable
    let name = xml::child_text(node, "Name")?;

    // CRS declarations are inherited from ancestor layers (WMS 1.3.0 §7.2.4.6.7)
    let mut crs: Vec<String> = node
        .ancestors()
        .filter(|a| a.is_element() && a.tag_name().name() == "Layer")
        .flat_map(|a| xml::children(a, "CRS"))
        .filter_map(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    crs.dedup();

    let keywords = xml::child(node, "KeywordList")
        .map(|kl| {
            xml::children(kl, "Keyword")
                .into_iter()
                .filter_map(|k| k.text())
                .map(|t| t.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let styles = xml::children(node, "Style")
        .into_iter()
        .filter_map(|s| xml::child_text(s, "Name"))
        .collect();

    Some(WmsLayer {
        title: xml::child_text(node, "Title"),
        abstract_: xml::child_text(node, "Abstract"),
        keywords,
        bbox: parse_geographic_bbox(node),
        styles,
        metadata_urls: xml::metadata_hrefs(node, "MetadataURL"),
        queryable: matches!(
            node.attribute("queryable"),
            Some("1") | Some("true")
        ),
        crs,
        name,
    })
}

pub(crate) struct WmsProbe;

#[async_trait]
impl CapabilityProbe for WmsProbe {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Wms
    }

    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> Result<Capabilities, HarvestError> {
        let request_url = kvp_request_url(url, "WMS", "GetCapabilities", Some("1.3.0"), &[])?;
        let text = fetch_text(client, &request_url).await?;
        let doc = Document::parse(&text)?;
        let root = doc.root_element();

        if !matches!(
            root.tag_name().name(),
            "WMS_Capabilities" | "WMT_MS_Capabilities"
        ) {
            return Err(HarvestError::Invalid(format!(
                "not a WMS capabilities document (root element {})",
                root.tag_name().name()
            )));
        }

        let service = xml::child(root, "Service");
        let service_title = service.and_then(|s| xml::child_text(s, "Title"));
        let service_abstract = service.and_then(|s| xml::child_text(s, "Abstract"));

        let layers: Vec<WmsLayer> = root
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "Layer")
            .filter_map(parse_layer)
            .collect();

        let layer_all: Vec<String> = layers.iter().map(|l| l.name.clone()).collect();
        let matched = select_layer(&layers, layer_hint, record_id);

        let caps = match matched {
            Some(layer) => WmsCapabilities {
                layer_name: Some(layer.name.clone()),
                layer_all,
                title: layer.title.clone(),
                abstract_: layer.abstract_.clone(),
                queryable: layer.queryable,
                keywords: layer.keywords.clone(),
                bbox: layer.bbox,
                crs4326: layer.crs.iter().any(|c| c == "EPSG:4326"),
                crs3857: layer.crs.iter().any(|c| c == "EPSG:3857"),
                styles: layer.styles.clone(),
                metadata_urls: layer.metadata_urls.clone(),
            },
            None => WmsCapabilities {
                layer_name: None,
                layer_all,
                // Without a layer hint the service-level identification is
                // the best available description of the endpoint
                title: if layer_hint.is_none() { service_title } else { None },
                abstract_: if layer_hint.is_none() {
                    service_abstract
                } else {
                    None
                },
                queryable: false,
                keywords: Vec::new(),
                bbox: None,
                crs4326: false,
                crs3857: false,
                styles: Vec::new(),
                metadata_urls: Vec::new(),
            },
        };

        Ok(Capabilities::Wms(caps))
    }
}
