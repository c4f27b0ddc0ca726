//! Postgres persistence for records, links and validation history
//!
//! One transaction per link keeps a crashed run from losing more than
//! the link it was writing. The failure-counting state machine lives in
//! [`LinkState::apply`]; this module only reads the previous state under
//! `FOR UPDATE` and writes the computed next state back.

use std::collections::HashSet;

use deadpool_postgres::{ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{DeprecationPolicy, LinkState, ProbeResult};

const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS records (
        id SERIAL PRIMARY KEY,
        record_id TEXT UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS links (
        id_link SERIAL PRIMARY KEY,
        urlname TEXT UNIQUE,
        link_type TEXT,
        link_size BIGINT,
        last_modified TIMESTAMP,
        fk_record INTEGER REFERENCES records(id),
        deprecated BOOLEAN DEFAULT FALSE,
        consecutive_failures INTEGER DEFAULT 0,
        capabilities JSON DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS validation_history (
        id SERIAL PRIMARY KEY,
        fk_link INTEGER REFERENCES links(id_link),
        status_code INTEGER,
        is_redirect BOOLEAN,
        error_message TEXT,
        timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )",
];

/// Whether a history row is appended for this check: only while the
/// link is not deprecated after the current update, so permanently dead
/// links stop accumulating rows
fn should_record_history(state: LinkState) -> bool {
    !state.deprecated
}

/// Result of persisting one probe outcome
#[derive(Debug, Clone, Copy)]
pub struct UpsertOutcome {
    pub link_id: i32,
    pub deprecated: bool,
    /// History rows are only appended for links that are not deprecated
    pub history_recorded: bool,
}

/// Aggregate success/failure counts over the whole validation history
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryStats {
    pub total: i64,
    pub successful: i64,
}

/// Connection-pooled store over the three link-assessment tables
pub struct LinkStore {
    pool: Pool,
}

impl LinkStore {
    /// Build the connection pool from database configuration
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg = deadpool_postgres::Config::new();
        pg.host = Some(config.host.clone());
        pg.port = Some(config.port);
        pg.dbname = Some(config.dbname.clone());
        pg.user = Some(config.user.clone());
        pg.password = Some(config.password.clone());
        if let Some(schema) = &config.schema {
            pg.options = Some(format!("-c search_path={schema}"));
        }
        pg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = pg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        pool.resize(config.pool_size);

        info!(
            host = %config.host,
            dbname = %config.dbname,
            pool_size = config.pool_size,
            "database pool created"
        );
        Ok(Self { pool })
    }

    /// Create the tables if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;
        for statement in SCHEMA_SQL {
            client.execute(*statement, &[]).await?;
        }
        debug!("schema ensured");
        Ok(())
    }

    /// Persist one probe outcome
    ///
    /// Inserts the owning record if needed, advances the link's failure
    /// state under row lock, upserts the link and appends a history row
    /// unless the link ends up deprecated. All in one transaction.
    pub async fn upsert_link(
        &self,
        probe: &ProbeResult,
        capabilities: &serde_json::Value,
        record_url: Option<&str>,
        policy: DeprecationPolicy,
        max_failures: i32,
    ) -> Result<UpsertOutcome> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let fk_record: Option<i32> = match record_url {
            Some(record_url) => {
                tx.execute(
                    "INSERT INTO records (record_id) VALUES ($1) ON CONFLICT (record_id) DO NOTHING",
                    &[&record_url],
                )
                .await?;
                let row = tx
                    .query_one("SELECT id FROM records WHERE record_id = $1", &[&record_url])
                    .await?;
                Some(row.get(0))
            }
            None => None,
        };

        let previous = tx
            .query_opt(
                "SELECT consecutive_failures, deprecated FROM links \
                 WHERE urlname = $1 FOR UPDATE",
                &[&probe.url],
            )
            .await?
            .map(|row| LinkState {
                consecutive_failures: row.get(0),
                deprecated: row.get(1),
            })
            .unwrap_or_default();

        let next = previous.apply(probe.valid, policy, max_failures);

        let status_code: Option<i32> = probe.status_code.map(i32::from);
        let link_id: i32 = tx
            .query_one(
                "INSERT INTO links (urlname, link_type, link_size, last_modified, \
                                    fk_record, deprecated, consecutive_failures, capabilities) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (urlname) DO UPDATE SET \
                     link_type = EXCLUDED.link_type, \
                     link_size = EXCLUDED.link_size, \
                     last_modified = EXCLUDED.last_modified, \
                     deprecated = EXCLUDED.deprecated, \
                     consecutive_failures = EXCLUDED.consecutive_failures, \
                     capabilities = EXCLUDED.capabilities \
                 RETURNING id_link",
                &[
                    &probe.url,
                    &probe.content_type,
                    &probe.content_size,
                    &probe.last_modified_utc(),
                    &fk_record,
                    &next.deprecated,
                    &next.consecutive_failures,
                    capabilities,
                ],
            )
            .await?
            .get(0);

        let history_recorded = should_record_history(next);
        if history_recorded {
            tx.execute(
                "INSERT INTO validation_history (fk_link, status_code, is_redirect, error_message) \
                 VALUES ($1, $2, $3, $4)",
                &[&link_id, &status_code, &probe.is_redirect, &probe.error],
            )
            .await?;
        }

        tx.commit().await?;

        Ok(UpsertOutcome {
            link_id,
            deprecated: next.deprecated,
            history_recorded,
        })
    }

    /// URLs currently flagged deprecated
    pub async fn deprecated_urls(&self) -> Result<HashSet<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT urlname FROM links WHERE deprecated", &[])
            .await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    /// Success/total counts across the whole validation history
    pub async fn history_stats(&self) -> Result<HistoryStats> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE status_code BETWEEN 200 AND 399) \
                 FROM validation_history",
                &[],
            )
            .await?;
        Ok(HistoryStats {
            total: row.get(0),
            successful: row.get(1),
        })
    }
}
