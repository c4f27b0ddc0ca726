//! linkhawk - Link liveliness assessment for OGC metadata catalogues
//!
//! Harvests hyperlinks from an OGC-API-Features catalogue, classifies them
//! as geospatial services (WMS/WMTS/WFS/WCS/OGC-API-Features) or plain
//! resources, probes every URL for liveness, retrieves capability metadata
//! for recognized services and persists the outcome with a failure-counting
//! deprecation state machine.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`catalogue`] - Catalogue pagination and link classification
//! - [`services`] - Service-type detection and capability harvesting
//! - [`checker`] - Concurrent liveness probing
//! - [`storage`] - PostgreSQL persistence (links, records, history)
//! - [`pipeline`] - Run orchestration
//! - [`models`] - Core data structures and types
//!
//! # Example
//!
//! ```no_run
//! use linkhawk::config::Config;
//! use linkhawk::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(config).await?;
//!     let summary = pipeline.run().await?;
//!     println!("checked {} links", summary.links_checked);
//!     Ok(())
//! }
//! ```

pub mod catalogue;
pub mod checker;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::checker::LivenessChecker;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        Capabilities, CapabilityOutcome, DeprecationPolicy, ProbeResult, ServiceKind,
    };
    pub use crate::pipeline::{Pipeline, RunSummary};
    pub use crate::storage::LinkStore;
}

// Direct re-exports for convenience
pub use models::{CapabilityOutcome, DeprecationPolicy, ProbeResult, ServiceKind};
