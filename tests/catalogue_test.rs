//! Integration tests for catalogue pagination and classification

mod common;

use std::collections::HashMap;

use linkhawk::catalogue::{classify_feature, CatalogPager};
use linkhawk::error::Error;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEMS_PATH: &str = "/collections/metadata:main/items";

/// Page count is derived from the initial metadata fetch
#[tokio::test]
async fn test_pagination_resolution() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("f", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::items_page(25, 10, &[])))
        .mount(&mock_server)
        .await;

    let pager = CatalogPager::new(
        reqwest::Client::new(),
        &common::catalogue_config(&mock_server.uri()),
    );
    let info = pager.pagination().await.unwrap();

    assert_eq!(info.number_matched, 25);
    assert_eq!(info.page_size, 10);
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.offsets().collect::<Vec<_>>(), vec![0, 10, 20]);
}

/// A failing metadata fetch aborts the run
#[tokio::test]
async fn test_pagination_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let pager = CatalogPager::new(
        reqwest::Client::new(),
        &common::catalogue_config(&mock_server.uri()),
    );
    let err = pager.pagination().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::Pagination(_)));
}

/// A single failing page is skippable, the rest of the crawl continues
#[tokio::test]
async fn test_page_failure_is_skippable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::items_page(
            20,
            10,
            &[("rec-1", "https://data.example.org/a.zip")],
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let pager = CatalogPager::new(
        reqwest::Client::new(),
        &common::catalogue_config(&mock_server.uri()),
    );

    let ok = pager.fetch_page(0).await.unwrap();
    assert_eq!(ok.len(), 1);

    let err = pager.fetch_page(10).await.unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(err, Error::PageFetch { offset: 10, .. }));
}

/// Crawled features classify into the URL→link map, skipping self links
#[tokio::test]
async fn test_crawl_and_classify() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::items_page(
            2,
            2,
            &[
                ("rec-1", "https://data.example.org/a.zip"),
                ("rec-2", "https://maps.example.org/wms"),
            ],
        )))
        .mount(&mock_server)
        .await;

    let pager = CatalogPager::new(
        reqwest::Client::new(),
        &common::catalogue_config(&mock_server.uri()),
    );

    let mut links = HashMap::new();
    for feature in &pager.fetch_page(0).await.unwrap() {
        classify_feature(feature, &mut links);
    }

    // The rel=self link of each feature is navigational and dropped
    assert_eq!(links.len(), 2);
    assert_eq!(links["https://data.example.org/a.zip"].record_id, "rec-1");
    assert_eq!(links["https://maps.example.org/wms"].record_id, "rec-2");
}
