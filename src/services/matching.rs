//! Layer/feature/coverage selection shared by all XML-based services
//!
//! Precedence: exact name equals the layer hint; exactly one layer on the
//! service; a metadata URL containing the record id; title equal to the
//! hint case-insensitively. No match leaves the envelope's matched-layer
//! fields null while still reporting `layer_all`.

/// Minimal view of a parsed capability layer used for matching
pub trait LayerLike {
    fn name(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn metadata_urls(&self) -> &[String];
}

/// Select the target layer per the documented precedence
pub fn select_layer<'a, L: LayerLike>(
    layers: &'a [L],
    layer_hint: Option<&str>,
    record_id: Option<&str>,
) -> Option<&'a L> {
    if let Some(hint) = layer_hint.filter(|h| !h.is_empty()) {
        if let Some(layer) = layers.iter().find(|l| l.name() == hint) {
            return Some(layer);
        }
    }

    if layers.len() == 1 {
        return layers.first();
    }

    if let Some(record_id) = record_id.filter(|r| !r.is_empty()) {
        if let Some(layer) = layers
            .iter()
            .find(|l| l.metadata_urls().iter().any(|u| u.contains(record_id)))
        {
            return Some(layer);
        }
    }

    if let Some(hint) = layer_hint.filter(|h| !h.is_empty()) {
        if let Some(layer) = layers
            .iter()
            .find(|l| l.title().is_some_and(|t| t.eq_ignore_ascii_case(hint)))
        {
            return Some(layer);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestLayer {
        name: String,
        title: Option<String>,
        metadata_urls: Vec<String>,
    }

    impl TestLayer {
        fn new(name: &str, title: Option<&str>) -> Self {
            Self {
                name: name.to_string(),
                title: title.map(String::from),
                metadata_urls: Vec::new(),
            }
        }
    }

    impl LayerLike for TestLayer {
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

    #[test]
    fn test_exact_name_takes_precedence_over_title() {
        // "alpha" carries the title "beta"; exact name match on the layer
        // actually called "beta" must still win.
        let layers = vec![
            TestLayer::new("alpha", Some("beta")),
            TestLayer::new("beta", Some("Vegetation cover")),
        ];
        let matched = select_layer(&layers, Some("beta"), None).unwrap();
        assert_eq!(matched.name(), "beta");
    }

    #[test]
    fn test_single_layer_service_matches_without_hint() {
        let layers = vec![TestLayer::new("only", Some("The only layer"))];
        let matched = select_layer(&layers, None, None).unwrap();
        assert_eq!(matched.name(), "only");
    }

    #[test]
    fn test_metadata_url_match() {
        let mut layer = TestLayer::new("soil", None);
        layer.metadata_urls = vec![
            "https://cat.example.org/collections/metadata:main/items/rec-42?f=xml".to_string(),
        ];
        let layers = vec![TestLayer::new("other", None), layer];
        let matched = select_layer(&layers, None, Some("rec-42")).unwrap();
        assert_eq!(matched.name(), "soil");
    }

    #[test]
    fn test_metadata_url_match_on_bare_record_id() {
        // CSW-style metadata URLs carry only the feature id, so matching
        // must work against the bare id, not the catalogue item URL
        let mut layer = TestLayer::new("soil", None);
        layer.metadata_urls = vec![
            "https://csw.example.org/?service=CSW&request=GetRecordById&id=rec-42".to_string(),
        ];
        let layers = vec![TestLayer::new("other", None), layer];
        assert_eq!(
            select_layer(&layers, None, Some("rec-42")).unwrap().name(),
            "soil"
        );
        // The canonical item URL would not be a substring of that URL
        assert!(select_layer(
            &layers,
            None,
            Some("https://cat.example.org/collections/metadata:main/items/rec-42")
        )
        .is_none());
    }

    #[test]
    fn test_title_fallback_is_case_insensitive() {
        let layers = vec![
            TestLayer::new("l1", Some("Soil Organic Carbon")),
            TestLayer::new("l2", Some("Land Use")),
        ];
        let matched = select_layer(&layers, Some("soil organic carbon"), None).unwrap();
        assert_eq!(matched.name(), "l1");
    }

    #[test]
    fn test_no_match_returns_none() {
        let layers = vec![
            TestLayer::new("l1", Some("A")),
            TestLayer::new("l2", Some("B")),
        ];
        assert!(select_layer(&layers, Some("missing"), Some("rec-1")).is_none());
        assert!(select_layer(&layers, None, None).is_none());
    }
}
