//! Small roxmltree helpers shared by the capability parsers
//!
//! OGC capability documents mix several namespaces (ows, wms, wfs, wmts,
//! xlink); matching on local names keeps the parsers tolerant of prefix
//! variations across server implementations.

use roxmltree::Node;

/// First child element with the given local name
pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// All child elements with the given local name
pub(crate) fn children<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Vec<Node<'a, 'i>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

/// Trimmed text content of the first child element with the given local
/// name, if non-empty
pub(crate) fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Attribute value looked up by local name (covers `xlink:href` et al.)
pub(crate) fn attr_local(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value().to_string())
}

/// Parse an ows corner ("lon lat") into a coordinate pair
fn parse_corner(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

/// Read an `ows:WGS84BoundingBox` child into `[minx, miny, maxx, maxy]`
pub(crate) fn wgs84_bbox(node: Node<'_, '_>) -> Option<[f64; 4]> {
    let bbox = child(node, "WGS84BoundingBox")?;
    let (minx, miny) = parse_corner(&child_text(bbox, "LowerCorner")?)?;
    let (maxx, maxy) = parse_corner(&child_text(bbox, "UpperCorner")?)?;
    Some([minx, miny, maxx, maxy])
}

/// Collect href attributes from child elements named `elem`, looking
/// through a nested `OnlineResource` when the element itself carries no
/// href (the WMS 1.3.0 `MetadataURL` shape)
pub(crate) fn metadata_hrefs(node: Node<'_, '_>, elem: &str) -> Vec<String> {
    children(node, elem)
        .into_iter()
        .filter_map(|m| {
            attr_local(m, "href")
                .or_else(|| child(m, "OnlineResource").and_then(|o| attr_local(o, "href")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_local_name_lookup_ignores_prefixes() {
        let doc = Document::parse(
            r#"<root xmlns:ows="http://www.opengis.net/ows/1.1">
                 <ows:Title> Soil grid </ows:Title>
               </root>"#,
        )
        .unwrap();
        assert_eq!(
            child_text(doc.root_element(), "Title").as_deref(),
            Some("Soil grid")
        );
    }

    #[test]
    fn test_wgs84_bbox_parsing() {
        let doc = Document::parse(
            r#"<Layer xmlns:ows="http://www.opengis.net/ows/1.1">
                 <ows:WGS84BoundingBox>
                   <ows:LowerCorner>-180 -90</ows:LowerCorner>
                   <ows:UpperCorner>180 90</ows:UpperCorner>
                 </ows:WGS84BoundingBox>
               </Layer>"#,
        )
        .unwrap();
        assert_eq!(
            wgs84_bbox(doc.root_element()),
            Some([-180.0, -90.0, 180.0, 90.0])
        );
    }

    #[test]
    fn test_metadata_hrefs_direct_and_nested() {
        let doc = Document::parse(
            r#"<Layer xmlns:xlink="http://www.w3.org/1999/xlink">
                 <MetadataURL xlink:href="https://cat.example.org/rec-1"/>
                 <MetadataURL>
                   <OnlineResource xlink:href="https://cat.example.org/rec-2"/>
                 </MetadataURL>
               </Layer>"#,
        )
        .unwrap();
        assert_eq!(
            metadata_hrefs(doc.root_element(), "MetadataURL"),
            vec![
                "https://cat.example.org/rec-1".to_string(),
                "https://cat.example.org/rec-2".to_string()
            ]
        );
    }
}
