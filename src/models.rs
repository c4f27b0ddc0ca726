//! Core data structures and types
//!
//! Probe results, service kinds, the capability envelopes persisted as the
//! link's `capabilities` blob, and the failure-counting link state machine.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Recognized OGC service kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Wms,
    Wmts,
    Wfs,
    Wcs,
    OgcApi,
}

impl ServiceKind {
    /// Convert to the wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Wms => "wms",
            ServiceKind::Wmts => "wmts",
            ServiceKind::Wfs => "wfs",
            ServiceKind::Wcs => "wcs",
            ServiceKind::OgcApi => "ogcapi",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single liveness probe
///
/// Transport failures are captured in `error` with every other field
/// nulled out; they never propagate as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub status_code: Option<u16>,
    pub is_redirect: bool,
    pub valid: bool,
    pub content_type: Option<String>,
    pub content_size: Option<i64>,
    /// Raw `Last-Modified` header value from the origin server
    pub last_modified: Option<String>,
    pub error: Option<String>,
}

impl ProbeResult {
    /// Build the failure shape for a transport-level error
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: None,
            is_redirect: false,
            valid: false,
            content_type: None,
            content_size: None,
            last_modified: None,
            error: Some(error.into()),
        }
    }

    /// Parse the `Last-Modified` header into a naive UTC timestamp
    /// suitable for the `links.last_modified` column
    pub fn last_modified_utc(&self) -> Option<NaiveDateTime> {
        let raw = self.last_modified.as_deref()?;
        chrono::DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|dt| dt.naive_utc())
    }
}

/// One link observed in the catalogue, before probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLink {
    pub url: String,
    /// Raw feature id of the owning catalogue record
    pub record_id: String,
    pub protocol: Option<String>,
    pub layer_hint: Option<String>,
    /// Thumbnail/preview links skip service detection entirely
    pub preview: bool,
}

/// WMS capability envelope (GetCapabilities 1.3.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsCapabilities {
    pub layer_name: Option<String>,
    pub layer_all: Vec<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub queryable: bool,
    pub keywords: Vec<String>,
    pub bbox: Option<[f64; 4]>,
    pub crs4326: bool,
    pub crs3857: bool,
    pub styles: Vec<String>,
    pub metadata_urls: Vec<String>,
}

/// WMTS capability envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmtsCapabilities {
    pub layer_name: Option<String>,
    pub layer_all: Vec<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub bbox: Option<[f64; 4]>,
    pub formats: Vec<String>,
    pub tilematrixsets: Vec<String>,
    pub metadata_urls: Vec<String>,
}

/// WFS capability envelope (GetCapabilities 2.0.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WfsCapabilities {
    pub layer_name: Option<String>,
    pub layer_all: Vec<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub keywords: Vec<String>,
    pub bbox: Option<[f64; 4]>,
    pub crs4326: bool,
    pub crs3857: bool,
    pub metadata_urls: Vec<String>,
    /// Property name to XSD type map of the matched feature type
    pub schema: Option<BTreeMap<String, String>>,
}

/// WCS capability envelope (GetCapabilities 2.0.1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WcsCapabilities {
    pub layer_name: Option<String>,
    pub layer_all: Vec<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub keywords: Vec<String>,
    pub bbox: Option<[f64; 4]>,
    pub supported_formats: Vec<String>,
    pub metadata_urls: Vec<String>,
}

/// OGC-API-Features collection envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OgcApiCapabilities {
    pub layer_name: Option<String>,
    pub layer_all: Vec<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub bbox: Option<Vec<f64>>,
    pub crs: Vec<String>,
}

/// Capability metadata for one service endpoint, tagged by service kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service_type", rename_all = "lowercase")]
pub enum Capabilities {
    Wms(WmsCapabilities),
    Wmts(WmtsCapabilities),
    Wfs(WfsCapabilities),
    Wcs(WcsCapabilities),
    OgcApi(OgcApiCapabilities),
}

impl Capabilities {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Capabilities::Wms(_) => ServiceKind::Wms,
            Capabilities::Wmts(_) => ServiceKind::Wmts,
            Capabilities::Wfs(_) => ServiceKind::Wfs,
            Capabilities::Wcs(_) => ServiceKind::Wcs,
            Capabilities::OgcApi(_) => ServiceKind::OgcApi,
        }
    }
}

/// Capability harvesting outcome for one link
///
/// `Failed` is the hard-failure sentinel: the capability document could
/// not be fetched or parsed. It is distinct from a harvested document
/// with no layer match, which still carries the full envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutcome {
    /// Plain resource, no service detected
    NotService,
    Harvested(Box<Capabilities>),
    Failed {
        service_type: ServiceKind,
        error: String,
    },
}

impl CapabilityOutcome {
    pub fn harvested(caps: Capabilities) -> Self {
        Self::Harvested(Box::new(caps))
    }

    /// Serialize to the JSON blob stored in `links.capabilities`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CapabilityOutcome::NotService => json!({}),
            CapabilityOutcome::Harvested(caps) => {
                serde_json::to_value(caps.as_ref()).unwrap_or_else(|_| json!({}))
            }
            CapabilityOutcome::Failed {
                service_type,
                error,
            } => json!({
                "service_type": service_type.as_str(),
                "error": error,
            }),
        }
    }
}

/// What happens to a deprecated link when it comes back to life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeprecationPolicy {
    /// Any successful probe clears the flag and resets the counter
    SelfHealing,
    /// Deprecation is terminal; deprecated URLs are not rechecked
    Sticky,
}

impl Default for DeprecationPolicy {
    fn default() -> Self {
        Self::SelfHealing
    }
}

impl FromStr for DeprecationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self-healing" => Ok(Self::SelfHealing),
            "sticky" => Ok(Self::Sticky),
            other => Err(format!("unknown deprecation policy: {other}")),
        }
    }
}

/// The persisted failure-counting state of one link
///
/// `deprecated` is derived solely from [`LinkState::apply`]; nothing else
/// may set it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkState {
    pub consecutive_failures: i32,
    pub deprecated: bool,
}

impl LinkState {
    /// Apply one probe outcome, yielding the next state
    pub fn apply(self, valid: bool, policy: DeprecationPolicy, max_failures: i32) -> Self {
        if valid {
            let deprecated = match policy {
                DeprecationPolicy::SelfHealing => false,
                DeprecationPolicy::Sticky => self.deprecated,
            };
            Self {
                consecutive_failures: 0,
                deprecated,
            }
        } else {
            let failures = self.consecutive_failures + 1;
            Self {
                consecutive_failures: failures,
                deprecated: self.deprecated || failures >= max_failures,
            }
        }
    }
}
