//! Service-type detection and capability harvesting
//!
//! [`detect_service`] classifies a URL plus protocol hint into a
//! [`ServiceKind`]; the [`Harvester`] then fetches the endpoint's
//! capability/collection document through one [`CapabilityProbe`]
//! implementation per service kind and matches the target layer.

pub mod detect;
pub mod matching;
pub mod ogcapi;
pub mod wcs;
pub mod wfs;
pub mod wms;
pub mod wmts;
mod xml;

pub use detect::detect_service;
pub use matching::{select_layer, LayerLike};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::CheckerConfig;
use crate::error::Result;
use crate::models::{Capabilities, CapabilityOutcome, ServiceKind};

/// Why a capability document could not be turned into an envelope
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid document: {0}")]
    Invalid(String),
}

/// One capability retrieval strategy per service kind
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    fn kind(&self) -> ServiceKind;

    /// Fetch and parse the capability document, matching the target
    /// layer/collection where possible
    async fn fetch(
        &self,
        client: &Client,
        url: &str,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> std::result::Result<Capabilities, HarvestError>;
}

/// Build a KVP request URL, replacing any existing service/request/version
/// parameters with the given operation
pub(crate) fn kvp_request_url(
    url: &str,
    service: &str,
    request: &str,
    version: Option<&str>,
    extra: &[(&str, &str)],
) -> std::result::Result<String, HarvestError> {
    let mut parsed = url::Url::parse(url)
        .map_err(|e| HarvestError::Invalid(format!("unparseable URL {url}: {e}")))?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| {
            !matches!(
                k.to_lowercase().as_str(),
                "service" | "request" | "version"
            )
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("service", service);
        pairs.append_pair("request", request);
        if let Some(version) = version {
            pairs.append_pair("version", version);
        }
        for (k, v) in extra {
            pairs.append_pair(k, v);
        }
    }

    Ok(parsed.as_str().to_string())
}

/// Fetch a capability document as text, failing on HTTP error statuses
pub(crate) async fn fetch_text(
    client: &Client,
    url: &str,
) -> std::result::Result<String, HarvestError> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(text)
}

/// Capability harvester dispatching to the per-kind probes
pub struct Harvester {
    client: Client,
}

impl Harvester {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    fn probe_for(kind: ServiceKind) -> &'static dyn CapabilityProbe {
        match kind {
            ServiceKind::Wms => &wms::WmsProbe,
            ServiceKind::Wmts => &wmts::WmtsProbe,
            ServiceKind::Wfs => &wfs::WfsProbe,
            ServiceKind::Wcs => &wcs::WcsProbe,
            ServiceKind::OgcApi => &ogcapi::OgcApiProbe,
        }
    }

    /// Harvest capability metadata for a classified service URL
    ///
    /// Transport and parse failures become the hard-failure sentinel;
    /// they are logged but never propagate.
    pub async fn harvest(
        &self,
        url: &str,
        kind: ServiceKind,
        layer_hint: Option<&str>,
        record_id: Option<&str>,
    ) -> CapabilityOutcome {
        match Self::probe_for(kind)
            .fetch(&self.client, url, layer_hint, record_id)
            .await
        {
            Ok(caps) => CapabilityOutcome::harvested(caps),
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    service = %kind,
                    error = %e,
                    "capability harvest failed"
                );
                CapabilityOutcome::Failed {
                    service_type: kind,
                    error: e.to_string(),
                }
            }
        }
    }
}
