//! Catalogue pagination over an OGC-API-Features items endpoint
//!
//! The first request reads `numberMatched`/`numberReturned` to compute a
//! trustworthy page count; each page is then fetched at
//! `items?offset=page*page_size`. Failure of the initial metadata fetch is
//! fatal; failure of a single page is surfaced as
//! [`Error::PageFetch`](crate::error::Error::PageFetch) so the caller can
//! log it and continue with a partial catalogue.

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::config::CatalogueConfig;
use crate::error::{Error, Result};

/// Pagination metadata of the collection's items endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub number_matched: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl PageInfo {
    /// Compute the page count from catalogue metadata
    pub fn from_counts(number_matched: u64, number_returned: u64) -> Result<Self> {
        if number_returned == 0 {
            return Err(Error::pagination(
                "catalogue reported a page size of zero (numberReturned = 0)",
            ));
        }
        Ok(Self {
            number_matched,
            page_size: number_returned,
            total_pages: number_matched.div_ceil(number_returned),
        })
    }

    /// Item offsets of every page, in order
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.total_pages).map(|page| page * self.page_size)
    }
}

/// Wire schema of one items page
#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(rename = "numberMatched", default)]
    number_matched: Option<u64>,
    #[serde(rename = "numberReturned", default)]
    number_returned: Option<u64>,
    #[serde(default)]
    features: Vec<Feature>,
}

/// One catalogue item record
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

/// One entry of a feature's `links[]` array
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LinkEntry {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Paginates the catalogue's items endpoint
pub struct CatalogPager {
    client: Client,
    items_url: String,
}

impl CatalogPager {
    pub fn new(client: Client, catalogue: &CatalogueConfig) -> Self {
        Self {
            client,
            items_url: catalogue.items_url(),
        }
    }

    /// Fetch pagination metadata. Any failure here is fatal for the run.
    pub async fn pagination(&self) -> Result<PageInfo> {
        let url = format!("{}?f=json", self.items_url);
        let page: ItemsPage = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::pagination(format!("{url}: {e}")))?
            .error_for_status()
            .map_err(|e| Error::pagination(format!("{url}: {e}")))?
            .json()
            .await
            .map_err(|e| Error::pagination(format!("{url}: invalid JSON: {e}")))?;

        let info = PageInfo::from_counts(
            page.number_matched.unwrap_or(0),
            page.number_returned.unwrap_or(0),
        )?;

        tracing::info!(
            number_matched = %info.number_matched,
            page_size = %info.page_size,
            total_pages = %info.total_pages,
            "catalogue pagination resolved"
        );

        Ok(info)
    }

    /// Fetch the features of the page starting at `offset`
    pub async fn fetch_page(&self, offset: u64) -> Result<Vec<Feature>> {
        let url = format!("{}?offset={offset}", self.items_url);
        let page: ItemsPage = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| Error::PageFetch { offset, source })?
            .error_for_status()
            .map_err(|source| Error::PageFetch { offset, source })?
            .json()
            .await
            .map_err(|source| Error::PageFetch { offset, source })?;

        Ok(page.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        let info = PageInfo::from_counts(25, 10).unwrap();
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.offsets().collect::<Vec<_>>(), vec![0, 10, 20]);
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let info = PageInfo::from_counts(30, 10).unwrap();
        assert_eq!(info.total_pages, 3);
    }

    #[test]
    fn test_empty_catalogue() {
        let info = PageInfo::from_counts(0, 10).unwrap();
        assert_eq!(info.total_pages, 0);
        assert_eq!(info.offsets().count(), 0);
    }

    #[test]
    fn test_zero_page_size_is_fatal() {
        assert!(PageInfo::from_counts(25, 0).is_err());
    }

    #[test]
    fn test_items_page_deserialization() {
        let raw = r#"{
            "numberMatched": 2,
            "numberReturned": 2,
            "features": [
                {"id": "rec-1", "links": [
                    {"href": "https://example.com/data.zip", "rel": "enclosure", "type": "application/zip"}
                ]},
                {"id": "rec-2"}
            ]
        }"#;
        let page: ItemsPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.number_matched, Some(2));
        assert_eq!(page.features.len(), 2);
        assert_eq!(page.features[0].links.len(), 1);
        assert!(page.features[1].links.is_empty());
    }
}
