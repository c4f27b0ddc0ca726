//! Service-type detection for catalogue link URLs
//!
//! Deterministic decision order: protocol hint first (with URL evidence
//! overriding a stale WFS label), then OGC-API URL patterns, then the
//! `service=` query parameter, then path segments.

use crate::models::ServiceKind;

/// URL fragments that identify an OGC-API-Features endpoint
const OGCAPI_PATTERNS: &[&str] = &["/ogc/features", "/ogcapi", "/api/features"];

fn is_ogcapi_url(url_lower: &str) -> bool {
    OGCAPI_PATTERNS.iter().any(|p| url_lower.contains(p))
}

fn service_from_query(url: &str) -> Option<ServiceKind> {
    let parsed = url::Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(k, _)| k.eq_ignore_ascii_case("service"))
        .map(|(_, v)| v.to_lowercase())?;
    match value.as_str() {
        "wms" => Some(ServiceKind::Wms),
        "wmts" => Some(ServiceKind::Wmts),
        "wfs" => Some(ServiceKind::Wfs),
        "wcs" => Some(ServiceKind::Wcs),
        _ => None,
    }
}

/// Classify a URL plus optional protocol hint into a service kind
///
/// Returns `None` for plain links.
pub fn detect_service(url: &str, protocol: Option<&str>) -> Option<ServiceKind> {
    if url.is_empty() {
        return None;
    }

    let url_lower = url.to_lowercase();
    let ogcapi_url = is_ogcapi_url(&url_lower);

    if let Some(protocol) = protocol.filter(|p| !p.is_empty()) {
        let protocol_lower = protocol.to_lowercase();

        if protocol_lower.contains("ogc api") {
            return Some(ServiceKind::OgcApi);
        }
        if protocol_lower.contains("wfs") && ogcapi_url {
            // URL evidence overrides a stale WFS protocol label
            tracing::debug!(url = %url, "URL suggests OGC API but protocol says WFS, using ogcapi");
            return Some(ServiceKind::OgcApi);
        }
        if protocol_lower.contains("wms") {
            return Some(ServiceKind::Wms);
        }
        if protocol_lower.contains("wmts") {
            return Some(ServiceKind::Wmts);
        }
        if protocol_lower.contains("wfs") {
            return Some(ServiceKind::Wfs);
        }
        if protocol_lower.contains("wcs") {
            return Some(ServiceKind::Wcs);
        }
        if protocol_lower.contains("ows") {
            // Generic OWS endpoints default to WMS
            return Some(ServiceKind::Wms);
        }
    }

    if ogcapi_url {
        return Some(ServiceKind::OgcApi);
    }

    if let Some(kind) = service_from_query(url) {
        return Some(kind);
    }

    if url_lower.contains("/wms") {
        Some(ServiceKind::Wms)
    } else if url_lower.contains("/wmts") {
        Some(ServiceKind::Wmts)
    } else if url_lower.contains("/wfs") {
        Some(ServiceKind::Wfs)
    } else if url_lower.contains("/wcs") {
        Some(ServiceKind::Wcs)
    } else {
        None
    }
}
