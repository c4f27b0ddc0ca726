//! HTTP liveness probing
//!
//! Each URL gets a cheap HEAD request first; servers that reject HEAD
//! (405 and friends) are retried once with GET. Probes never fail the
//! run: transport errors become a [`ProbeResult`] with the error string
//! recorded.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use reqwest::{header, redirect, Client, Method, Response};
use serde::Serialize;
use tracing::debug;

use crate::config::CheckerConfig;
use crate::error::Result;
use crate::models::{CapabilityOutcome, ProbeResult, ServiceKind};
use crate::services::{detect_service, Harvester};

/// Parse `Content-Range: bytes 0-0/12345` into the total size
fn content_range_total(value: &str) -> Option<i64> {
    let total = value.rsplit('/').next()?.trim();
    if total == "*" {
        return None;
    }
    total.parse().ok()
}

fn content_size(response: &Response) -> Option<i64> {
    // A 206 response's Content-Length covers only the requested range;
    // the Content-Range total is the real size
    if let Some(total) = response
        .headers()
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(content_range_total)
    {
        return Some(total);
    }
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn header_str(response: &Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Concurrent liveness checker over a bounded worker pool
pub struct LivenessChecker {
    client: Client,
    workers: usize,
}

impl LivenessChecker {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(10))
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            workers: config.workers,
        })
    }

    async fn probe(&self, url: &str) -> reqwest::Result<ProbeResult> {
        let mut response = self.client.request(Method::HEAD, url).send().await?;

        // Many WMS/WFS servers answer HEAD with 4xx while GET works fine
        if response.status().is_client_error() || response.status().is_server_error() {
            response = self.client.request(Method::GET, url).send().await?;
        }

        let status = response.status();
        Ok(ProbeResult {
            url: url.to_string(),
            status_code: Some(status.as_u16()),
            is_redirect: response.url().as_str() != url,
            valid: status.is_success() || status.is_redirection(),
            content_type: header_str(&response, header::CONTENT_TYPE)
                .map(|ct| ct.split(';').next().unwrap_or(&ct).trim().to_string()),
            content_size: content_size(&response),
            last_modified: header_str(&response, header::LAST_MODIFIED),
            error: None,
        })
    }

    /// Probe a single URL; transport errors are captured, not returned
    pub async fn check_url(&self, url: &str) -> ProbeResult {
        match self.probe(url).await {
            Ok(result) => {
                debug!(
                    url = %url,
                    status = ?result.status_code,
                    valid = result.valid,
                    "probed"
                );
                result
            }
            Err(e) => {
                debug!(url = %url, error = %e, "probe failed");
                ProbeResult::failure(url, e.to_string())
            }
        }
    }

    /// Probe all URLs concurrently, bounded by the worker-pool size
    pub async fn check_all<I>(&self, urls: I) -> HashMap<String, ProbeResult>
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(urls)
            .map(|url| async move {
                let result = self.check_url(&url).await;
                (url, result)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await
    }
}

/// On-demand report for a single URL, outside any catalogue run
#[derive(Debug, Serialize)]
pub struct OnDemandReport {
    pub probe: ProbeResult,
    pub service_type: Option<ServiceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<serde_json::Value>,
}

/// Check one URL without touching the database
///
/// Powers the `check` subcommand; capability harvesting is optional
/// since it costs an extra round trip per service URL.
pub async fn check_single_url(
    url: &str,
    with_capabilities: bool,
    config: &CheckerConfig,
) -> Result<OnDemandReport> {
    let checker = LivenessChecker::new(config)?;
    let probe = checker.check_url(url).await;
    let service_type = detect_service(url, None);

    let capabilities = match (with_capabilities, service_type) {
        (true, Some(kind)) => {
            let harvester = Harvester::new(config)?;
            let outcome = harvester.harvest(url, kind, None, None).await;
            match outcome {
                CapabilityOutcome::NotService => None,
                other => Some(other.to_json()),
            }
        }
        _ => None,
    };

    Ok(OnDemandReport {
        probe,
        service_type,
        capabilities,
    })
}
