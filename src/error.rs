//! Unified error handling for the linkhawk crate
//!
//! One error enum covers the failure modes that actually propagate.
//! Transport failures observed while probing a URL are deliberately *not*
//! part of this type: they are captured as data inside
//! [`ProbeResult`](crate::models::ProbeResult) so that a dead link can
//! never abort a run. Likewise a capability document that cannot be
//! fetched or parsed becomes a hard-failure sentinel in the harvested
//! outcome, not an `Err`.

use thiserror::Error;

/// Unified error type for the linkhawk crate
#[derive(Error, Debug)]
pub enum Error {
    /// The initial catalogue metadata fetch failed. Without it there is
    /// no trustworthy page count, so the run aborts.
    #[error("catalogue pagination failed: {0}")]
    Pagination(String),

    /// A single catalogue page could not be fetched. Callers log this
    /// and skip the page; it never aborts the run.
    #[error("failed to fetch catalogue page at offset {offset}: {source}")]
    PageFetch {
        offset: u64,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client errors outside the probe path
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database errors
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Connection pool checkout errors
    #[error("database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Connection pool construction errors
    #[error("database pool setup error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a fatal pagination error
    pub fn pagination(msg: impl Into<String>) -> Self {
        Self::Pagination(msg.into())
    }

    /// Whether this error aborts a pipeline run when surfaced from the
    /// pagination phase
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::PageFetch { .. })
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
