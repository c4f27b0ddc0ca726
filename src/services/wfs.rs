//! WFS capability harvesting (GetCapabilities 2.0.0)
//!
//! Besides the capability envelope, the matched feature type's schema is
//! resolved through DescribeFeatureType and attached as a property
//! name→type map.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use roxmltree::{Document, Node};

use super::matching::{select_layer, LayerLike};
use super::xml;
use super::{fetch_text, kvp_request_url, CapabilityProbe, HarvestError};
use crate::models::{Capabilities, ServiceKind, WfsCapabilities};

#[derive(Debug)]
struct WfsFeatureType {
    name: String,
    title: Option<String>,
    abstract_: Option<String>,
    keywords: Vec<String>,
    crs: Vec<String>,
    bbox: Option<[f64; 4]>,
    metadata_urls: Vec<String>,
}

impl LayerLike for WfsFeatureType {
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

fn crs_matches(crs: &[String], code: &str) -> bool {
    // CRS identifiers come as "EPSG:4326", "urn:ogc:def:crs:EPSG::4326"
    // or "http://www.opengis.net/def/crs/EPSG/0/4326"
    crs.iter().any(|c| c.contains(code))
}

fn parse_feature_type(node: Node<'_, '_>) -> Option<WfsFeatureType> {
    let mut crs: Vec<String> = Vec::new();
    if let Some(default) = xml::child_text(node, "DefaultCRS") {
        crs.push(default);
    }
    crs.extend(
        xml::children(node, "OtherCRS")
            .into_iter()
            .filter_map(|c| c.text())
            .map(|t| t.trim().to_string()),
    );

    let keywords = xml::child(node, "Keywords")
        .map(|kw| {
            xml::children(kw, "Keyword")
                .into_iter()
                .filter_map(|k| k.text())
                .map(|t| t.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(WfsFeatureType {
        name: xml::child_text(node, "Name")?,
        title: xml::child_text(node, "Title"),
        abstract_: xml::child_text(node, "Abstract"),
        keywords,
        bbox: xml::wgs84_bbox(node),
        metadata_urls: xml::metadata_hrefs(node, "MetadataURL"),
        crs,
    })
}

/// Resolve the feature type's schema via DescribeFeatureType
async fn fetch_schema(
    client: &Client,
    url: &str,
    type_name: &str,
) -> Result<BTreeMap<String, String>, HarvestError> {
    let request_url = kvp_request_url(
        url,
        "WFS",
        "DescribeFeatureType",
        Some("2.0.0"),
        &[("typeNames", type_name)],
    )?;
    let text = fetch_text(client, &request_url).await?;
    let doc = Document::parse(&text)?;

    let mut properties = BTreeMap::new();
    for element in doc
        .root_element()
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "element")
    {
        if let (Some(name), Some(type_)) = (element.attribute("name"), element.attribute("type")) {
            properties.insert(name.to_string(), type_.to_string());
        }
    }
    Ok(properties)
}

pub(crate) struct WfsProbe;

#[async_trait]
impl CapabilityProbe for WfsProbe {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Wfs
    }

    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> Result<Capabilities, HarvestError> {
        let request_url = kvp_request_url(url, "WFS", "GetCapabilities", Some("2.0.0"), &[])?;
        let text = fetch_text(client, &request_url).await?;
        let doc = Document::parse(&text)?;
        let root = doc.root_element();

        if root.tag_name().name() != "WFS_Capabilities" {
            return Err(HarvestError::Invalid(format!(
                "not a WFS capabilities document (root element {})",
                root.tag_name().name()
            )));
        }

        let features: Vec<WfsFeatureType> = xml::child(root, "FeatureTypeList")
            .map(|list| {
                xml::children(list, "FeatureType")
                    .into_iter()
                    .filter_map(parse_feature_type)
                    .collect()
            })
            .unwrap_or_default();

        let layer_all: Vec<String> = features.iter().map(|f| f.name.clone()).collect();
        let matched = select_layer(&features, layer_hint, record_id);

        let schema = match matched {
            Some(feature) => Some(fetch_schema(client, url, &feature.name).await?),
            None => None,
        };

        Ok(Capabilities::Wfs(WfsCapabilities {
            layer_name: matched.map(|f| f.name.clone()),
            title: matched.and_then(|f| f.title.clone()),
            abstract_: matched.and_then(|f| f.abstract_.clone()),
            keywords: matched.map(|f| f.keywords.clone()).unwrap_or_default(),
            bbox: matched.and_then(|f| f.bbox),
            crs4326: matched
                .map(|f| crs_matches(&f.crs, "4326") || crs_matches(&f.crs, "CRS84"))
                .unwrap_or(false),
            crs3857: matched
                .map(|f| crs_matches(&f.crs, "3857"))
                .unwrap_or(false),
            metadata_urls: matched
                .map(|f| f.metadata_urls.clone())
                .unwrap_or_default(),
            layer_all,
            schema,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS: &str = r#"<?xml version="1.0"?>
<WFS_Capabilities xmlns:ows="http://www.opengis.net/ows/1.1"
                  xmlns:xlink="http://www.w3.org/1999/xlink">
  <FeatureTypeList>
    <FeatureType>
      <Name>soil:profiles</Name>
      <Title>Soil profiles</Title>
      <Abstract>Observed soil profiles</Abstract>
      <ows:Keywords><ows:Keyword>soil</ows:Keyword></ows:Keywords>
      <DefaultCRS>urn:ogc:def:crs:EPSG::4326</DefaultCRS>
      <OtherCRS>urn:ogc:def:crs:EPSG::3857</OtherCRS>
      <ows:WGS84BoundingBox>
        <ows:LowerCorner>-10 35</ows:LowerCorner>
        <ows:UpperCorner>30 70</ows:UpperCorner>
      </ows:WGS84BoundingBox>
      <MetadataURL xlink:href="https://cat.example.org/items/rec-9"/>
    </FeatureType>
    <FeatureType>
      <Name>soil:samples</Name>
      <Title>Soil samples</Title>
    </FeatureType>
  </FeatureTypeList>
</WFS_Capabilities>"#;

    fn parse_all(text: &str) -> Vec<WfsFeatureType> {
        let doc = Document::parse(text).unwrap();
        let list = xml::child(doc.root_element(), "FeatureTypeList").unwrap();
        xml::children(list, "FeatureType")
            .into_iter()
            .filter_map(parse_feature_type)
            .collect()
    }

    #[test]
    fn test_feature_type_parsing() {
        let features = parse_all(CAPS);
        assert_eq!(features.len(), 2);
        let profiles = &features[0];
        assert_eq!(profiles.name, "soil:profiles");
        assert_eq!(profiles.keywords, vec!["soil".to_string()]);
        assert_eq!(profiles.bbox, Some([-10.0, 35.0, 30.0, 70.0]));
        assert_eq!(
            profiles.metadata_urls,
            vec!["https://cat.example.org/items/rec-9".to_string()]
        );
    }

    #[test]
    fn test_urn_crs_flags() {
        let features = parse_all(CAPS);
        assert!(crs_matches(&features[0].crs, "4326"));
        assert!(crs_matches(&features[0].crs, "3857"));
        assert!(!crs_matches(&features[1].crs, "4326"));
    }

    #[test]
    fn test_record_id_matching_via_metadata_url() {
        let features = parse_all(CAPS);
        let matched = select_layer(&features, None, Some("rec-9")).unwrap();
        assert_eq!(matched.name(), "soil:profiles");
    }

    #[test]
    fn test_schema_xsd_parsing() {
        let xsd = r#"<?xml version="1.0"?>
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <xsd:complexType name="profilesType">
    <xsd:sequence>
      <xsd:element name="depth" type="xsd:double"/>
      <xsd:element name="geom" type="gml:PointPropertyType"/>
    </xsd:sequence>
  </xsd:complexType>
</xsd:schema>"#;
        let doc = Document::parse(xsd).unwrap();
        let mut properties = BTreeMap::new();
        for element in doc
            .root_element()
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "element")
        {
            if let (Some(name), Some(type_)) =
                (element.attribute("name"), element.attribute("type"))
            {
                properties.insert(name.to_string(), type_.to_string());
            }
        }
        assert_eq!(properties["depth"], "xsd:double");
        assert_eq!(properties["geom"], "gml:PointPropertyType");
    }
}
