//! Link classification for catalogue features
//!
//! Filters navigational links out of each feature's `links[]` array and
//! extracts the href, protocol hint and layer-name hint of the rest.
//! Thumbnail/preview links are kept as plain URLs and never go through
//! service detection.

use std::collections::HashMap;

use crate::catalogue::pager::{Feature, LinkEntry};
use crate::models::ClassifiedLink;

/// Relations that point back into the catalogue rather than at content
const SKIP_RELS: &[&str] = &["collection", "self", "root", "prev", "next", "canonical"];

fn is_navigational(rel: Option<&str>) -> bool {
    rel.map(|r| {
        let r = r.to_ascii_lowercase();
        SKIP_RELS.contains(&r.as_str())
    })
    .unwrap_or(false)
}

fn is_preview(entry: &LinkEntry) -> bool {
    let protocol = entry.protocol.as_deref().unwrap_or("").to_ascii_lowercase();
    protocol.contains("thumbnail")
        || protocol.contains("image")
        || entry.rel.as_deref() == Some("preview")
        || entry.name.as_deref() == Some("preview")
}

/// Classify every content link of one feature into `out`
///
/// `out` maps URL to its classified form; when the same URL recurs across
/// records the most recent observation wins, which is sound because the
/// URL itself is the identity key downstream.
pub fn classify_feature(feature: &Feature, out: &mut HashMap<String, ClassifiedLink>) {
    let Some(record_id) = feature.id.as_deref() else {
        return;
    };

    for entry in &feature.links {
        let Some(href) = entry.href.as_deref() else {
            continue;
        };
        if !href.starts_with("http") {
            continue;
        }
        if is_navigational(entry.rel.as_deref()) {
            continue;
        }

        let preview = is_preview(entry);
        out.insert(
            href.to_string(),
            ClassifiedLink {
                url: href.to_string(),
                record_id: record_id.to_string(),
                protocol: if preview { None } else { entry.protocol.clone() },
                layer_hint: if preview { None } else { entry.name.clone() },
                preview,
            },
        );
    }
}
