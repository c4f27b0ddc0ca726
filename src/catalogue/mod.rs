//! Catalogue crawling: pagination and link classification
//!
//! [`pager`] walks an OGC-API-Features items endpoint page by page;
//! [`classifier`] turns each feature's `links[]` entries into candidate
//! URLs with their record, protocol and layer-name context.

pub mod classifier;
pub mod pager;

pub use classifier::classify_feature;
pub use pager::{CatalogPager, Feature, LinkEntry, PageInfo};
