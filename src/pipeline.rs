//! Run orchestration: crawl, classify, harvest, probe, persist
//!
//! A run is a single pass over the catalogue. Only the initial
//! pagination fetch can abort it; everything downstream degrades per
//! page or per link and is accounted for in the [`RunSummary`].

use std::collections::HashMap;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalogue::{classify_feature, CatalogPager};
use crate::checker::LivenessChecker;
use crate::config::Config;
use crate::error::Result;
use crate::models::{CapabilityOutcome, ClassifiedLink, DeprecationPolicy};
use crate::services::{detect_service, Harvester};
use crate::storage::LinkStore;

/// Aggregate outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pages_total: u64,
    pub pages_failed: u64,
    pub links_discovered: usize,
    pub links_checked: usize,
    pub links_valid: usize,
    pub links_failed: usize,
    pub links_deprecated: usize,
    pub persisted: usize,
    pub persist_failures: usize,
    /// All-time validation history counts, including previous runs
    pub history_total: i64,
    pub history_successful: i64,
    pub elapsed_secs: f64,
}

/// The crawl → classify → probe → harvest → persist pipeline
pub struct Pipeline {
    config: Config,
    pager: CatalogPager,
    harvester: Harvester,
    checker: LivenessChecker,
    store: LinkStore,
}

impl Pipeline {
    /// Build every stage and ensure the database schema exists
    pub async fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.checker.timeout())
            .user_agent(config.checker.user_agent.clone())
            .gzip(true)
            .build()?;

        let pager = CatalogPager::new(client, &config.catalogue);
        let harvester = Harvester::new(&config.checker)?;
        let checker = LivenessChecker::new(&config.checker)?;
        let store = LinkStore::connect(&config.database)?;
        store.ensure_schema().await?;

        Ok(Self {
            config,
            pager,
            harvester,
            checker,
            store,
        })
    }

    /// Crawl all pages, collecting the URL→link map (last write wins)
    async fn collect_links(&self) -> Result<(HashMap<String, ClassifiedLink>, u64, u64)> {
        let info = self.pager.pagination().await?;

        let mut links = HashMap::new();
        let mut pages_failed = 0u64;
        for offset in info.offsets() {
            match self.pager.fetch_page(offset).await {
                Ok(features) => {
                    for feature in &features {
                        classify_feature(feature, &mut links);
                    }
                }
                Err(e) => {
                    warn!(offset = offset, error = %e, "skipping catalogue page");
                    pages_failed += 1;
                }
            }
        }

        Ok((links, info.total_pages, pages_failed))
    }

    /// Harvest capability metadata for every service link, bounded by the
    /// worker-pool size. Plain and preview links map to the empty blob.
    ///
    /// Layer matching sees the bare feature id: metadata URLs usually
    /// carry just the id, not the full catalogue item URL.
    async fn harvest_all(
        &self,
        links: &HashMap<String, ClassifiedLink>,
    ) -> HashMap<String, serde_json::Value> {
        stream::iter(links.values())
            .map(|link| async move {
                let kind = if link.preview {
                    None
                } else {
                    detect_service(&link.url, link.protocol.as_deref())
                };
                let outcome = match kind {
                    Some(kind) => {
                        self.harvester
                            .harvest(
                                &link.url,
                                kind,
                                link.layer_hint.as_deref(),
                                Some(&link.record_id),
                            )
                            .await
                    }
                    None => CapabilityOutcome::NotService,
                };
                (link.url.clone(), outcome.to_json())
            })
            .buffer_unordered(self.config.checker.workers)
            .collect()
            .await
    }

    /// Execute one full run over the catalogue
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            catalogue = %self.config.catalogue.items_url(),
            workers = self.config.checker.workers,
            "starting run"
        );

        let (mut links, pages_total, pages_failed) = self.collect_links().await?;
        let links_discovered = links.len();
        info!(links = links_discovered, "catalogue crawled");

        // Under sticky deprecation, dead URLs are never rechecked
        if self.config.checker.deprecation_policy == DeprecationPolicy::Sticky {
            let deprecated = self.store.deprecated_urls().await?;
            links.retain(|url, _| !deprecated.contains(url));
            if links.len() < links_discovered {
                info!(
                    skipped = links_discovered - links.len(),
                    "skipping deprecated links"
                );
            }
        }

        let capabilities = self.harvest_all(&links).await;
        let probes = self.checker.check_all(links.keys().cloned()).await;

        let empty = serde_json::json!({});
        let mut summary = RunSummary {
            pages_total,
            pages_failed,
            links_discovered,
            links_checked: probes.len(),
            links_valid: 0,
            links_failed: 0,
            links_deprecated: 0,
            persisted: 0,
            persist_failures: 0,
            history_total: 0,
            history_successful: 0,
            elapsed_secs: 0.0,
        };

        for (url, probe) in &probes {
            if probe.valid {
                summary.links_valid += 1;
            } else {
                summary.links_failed += 1;
            }

            let caps = capabilities.get(url).unwrap_or(&empty);
            let record_url = links
                .get(url)
                .map(|link| self.config.catalogue.record_url(&link.record_id));

            match self
                .store
                .upsert_link(
                    probe,
                    caps,
                    record_url.as_deref(),
                    self.config.checker.deprecation_policy,
                    self.config.checker.max_failures,
                )
                .await
            {
                Ok(outcome) => {
                    summary.persisted += 1;
                    if outcome.deprecated {
                        summary.links_deprecated += 1;
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to persist link");
                    summary.persist_failures += 1;
                }
            }
        }

        let stats = self.store.history_stats().await?;
        summary.history_total = stats.total;
        summary.history_successful = stats.successful;
        summary.elapsed_secs = started.elapsed().as_secs_f64();

        info!(
            links_checked = summary.links_checked,
            links_valid = summary.links_valid,
            links_failed = summary.links_failed,
            links_deprecated = summary.links_deprecated,
            persist_failures = summary.persist_failures,
            elapsed_secs = format!("{:.1}", summary.elapsed_secs),
            "run finished"
        );

        Ok(summary)
    }
}
