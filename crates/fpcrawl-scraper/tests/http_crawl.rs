//! Integration tests for crawling catalog pages through `HttpSession`.
//!
//! Uses `wiremock` to serve the HTML fixtures from a local server, so the
//! full load → extract → emit → paginate loop runs over real HTTP without
//! touching the network.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fpcrawl_core::{CatalogTarget, CrawlConfig, ProductRecord};
use fpcrawl_scraper::{
    BrowserSession, CatalogCrawler, ContextProfile, CrawlSeed, HttpSession, NavigationRequest,
    PageHandle, ScraperError,
};

const PAGE_1: &str = include_str!("fixtures/catalog_page_1.html");
const PAGE_2: &str = include_str!("fixtures/catalog_page_2.html");
const EMPTY: &str = include_str!("fixtures/empty_catalog.html");

const CATALOG_PATH: &str = "/catalog/ukhod-za-polostyu-rta";

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn test_session(max_retries: u32) -> HttpSession {
    HttpSession::new(5, max_retries, 0).expect("failed to build test HttpSession")
}

fn test_config(snapshot_dir: &std::path::Path) -> CrawlConfig {
    CrawlConfig::for_tests(snapshot_dir.to_path_buf())
}

/// Serves page 1 at the catalog path and page 2 at `?page=2`.
async fn mount_two_page_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(query_param("page", "2"))
        .respond_with(html(PAGE_2))
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_1))
        .expect(1)
        .mount(server)
        .await;
}

fn collected(sink: Mutex<Vec<ProductRecord>>) -> Vec<ProductRecord> {
    sink.into_inner().expect("sink lock poisoned")
}

// ---------------------------------------------------------------------------
// Multi-page traversal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crawl_follows_next_arrow_across_pages() {
    let server = MockServer::start().await;
    mount_two_page_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let crawler = CatalogCrawler::new(test_session(0), test_config(dir.path()));
    let sink = Mutex::new(Vec::new());
    let seed = CrawlSeed::new(format!("{}{CATALOG_PATH}", server.uri()));

    let summary = crawler
        .crawl(vec![seed], &sink, &CancellationToken::new())
        .await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.records_emitted, 3);
    assert_eq!(summary.records_skipped, 1);
    assert_eq!(summary.failed_pages, 0);
    assert!(!summary.cancelled);

    let records = collected(sink);
    assert_eq!(records.len(), 3);

    let paste = &records[0];
    assert_eq!(
        paste.source_url,
        format!(
            "{}/catalog/kosmetika-i-gigiena/p-123-zubnaya-pasta-colgate",
            server.uri()
        )
    );
    assert_eq!(paste.title, "Зубная паста, Colgate");
    assert_eq!(paste.brand, "Colgate");
    assert_eq!(paste.size(), "100 мл");
    assert!((paste.price.current - 99.0).abs() < f64::EPSILON);
    assert!((paste.price.original - 129.0).abs() < f64::EPSILON);
    assert_eq!(paste.price.discount_label, "Скидка 23%");
    assert_eq!(paste.marketing_tags, ["Хит"]);
    assert_eq!(
        paste.assets.main_image,
        "https://img.fix-price.com/800x800/colgate-1.webp"
    );

    let brush = &records[1];
    assert_eq!(
        brush.source_url,
        "https://fix-price.com/catalog/kosmetika-i-gigiena/p-456-shchetka"
    );
    assert!((brush.price.current - 55.0).abs() < f64::EPSILON);
    assert_eq!(brush.price.discount_label, "");

    let rinse = &records[2];
    assert_eq!(rinse.title, "Ополаскиватель, Lacalut");
    assert!((rinse.price.current - 1299.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn crawl_sends_city_cookie_and_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(header(
            "cookie",
            "selectedCity=%D0%95%D0%BA%D0%B0%D1%82%D0%B5%D1%80%D0%B8%D0%BD%D0%B1%D1%83%D1%80%D0%B3",
        ))
        .and(header("user-agent", "fpcrawl-test/0.1"))
        .respond_with(html(PAGE_2))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CatalogCrawler::new(test_session(0), test_config(dir.path()));
    let target = CatalogTarget {
        name: "oral-care".to_owned(),
        url: format!("{}{CATALOG_PATH}", server.uri()),
        city: Some("Екатеринбург".to_owned()),
    };
    let sink = Mutex::new(Vec::new());

    let summary = crawler
        .crawl(
            vec![CrawlSeed::from(&target)],
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(summary.failed_pages, 0, "headers did not match: {summary:?}");
    assert_eq!(summary.records_emitted, 1);
}

// ---------------------------------------------------------------------------
// Empty and failed pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_page_writes_no_products_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(EMPTY))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CatalogCrawler::new(test_session(0), test_config(dir.path()));
    let seed = CrawlSeed::new(format!("{}{CATALOG_PATH}", server.uri()));

    let summary = crawler
        .crawl(vec![seed], &Mutex::new(Vec::new()), &CancellationToken::new())
        .await;

    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.empty_pages, 1);
    assert_eq!(summary.records_emitted, 0);

    let snapshot = dir
        .path()
        .join(format!("no-products-{}-0.html", crawler.crawl_id()));
    let saved = std::fs::read_to_string(&snapshot).expect("snapshot written");
    assert!(saved.contains("Товары не найдены"));
}

#[tokio::test]
async fn not_found_seed_fails_alone_and_crawl_continues() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_2))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CatalogCrawler::new(test_session(0), test_config(dir.path()));
    let seeds = vec![
        CrawlSeed::new(format!("{}/catalog/missing", server.uri())),
        CrawlSeed::new(format!("{}{CATALOG_PATH}", server.uri())),
    ];
    let sink = Mutex::new(Vec::new());

    let summary = crawler
        .crawl(seeds, &sink, &CancellationToken::new())
        .await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.failed_pages, 1);
    assert_eq!(summary.records_emitted, 1);
    assert_eq!(collected(sink)[0].title, "Ополаскиватель, Lacalut");

    let snapshot = dir
        .path()
        .join(format!("error-{}-0.html", crawler.crawl_id()));
    assert!(snapshot.exists(), "expected error snapshot at {snapshot:?}");
}

#[tokio::test]
async fn rate_limited_navigation_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_2))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = CatalogCrawler::new(test_session(1), test_config(dir.path()));
    let seed = CrawlSeed::new(format!("{}{CATALOG_PATH}", server.uri()));

    let summary = crawler
        .crawl(vec![seed], &Mutex::new(Vec::new()), &CancellationToken::new())
        .await;

    assert_eq!(summary.failed_pages, 0);
    assert_eq!(summary.records_emitted, 1);
}

#[tokio::test]
async fn slow_first_load_is_retried_within_navigation_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_2).set_delay(std::time::Duration::from_secs(3)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_2))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.navigation_timeout_secs = 1;
    config.max_retries = 2;
    config.retry_backoff_base_secs = 0;
    let session = HttpSession::from_config(&config).unwrap();
    let crawler = CatalogCrawler::new(session, config);
    let seed = CrawlSeed::new(format!("{}{CATALOG_PATH}", server.uri()));

    let summary = crawler
        .crawl(vec![seed], &Mutex::new(Vec::new()), &CancellationToken::new())
        .await;

    assert_eq!(summary.failed_pages, 0, "slow load was not retried: {summary:?}");
    assert_eq!(summary.records_emitted, 1);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

// ---------------------------------------------------------------------------
// HttpPage status mapping
// ---------------------------------------------------------------------------

async fn navigate_once(server: &MockServer, status: u16) -> Result<(), ScraperError> {
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;

    let session = test_session(0);
    let profile = ContextProfile::from_config(&CrawlConfig::for_tests(std::env::temp_dir()));
    let mut page = session.new_page(&profile).await?;
    let result = page
        .navigate(&NavigationRequest {
            url: format!("{}/status", server.uri()),
            cookies: Vec::new(),
            timeout: std::time::Duration::from_secs(5),
        })
        .await;
    page.close().await;
    result
}

#[tokio::test]
async fn navigate_maps_404_to_not_found() {
    let server = MockServer::start().await;
    let err = navigate_once(&server, 404).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::NotFound { ref url } if url.ends_with("/status")),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn navigate_maps_429_to_rate_limited() {
    let server = MockServer::start().await;
    let err = navigate_once(&server, 429).await.unwrap_err();
    assert!(
        matches!(
            err,
            ScraperError::RateLimited {
                ref domain,
                retry_after_secs: 60
            } if domain == "127.0.0.1"
        ),
        "expected RateLimited, got: {err:?}"
    );
}

#[tokio::test]
async fn navigate_maps_server_error_to_unexpected_status() {
    let server = MockServer::start().await;
    let err = navigate_once(&server, 503).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus, got: {err:?}"
    );
}

#[tokio::test]
async fn navigate_records_final_url_and_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(html(PAGE_2))
        .mount(&server)
        .await;

    let session = test_session(0);
    let profile = ContextProfile::from_config(&CrawlConfig::for_tests(std::env::temp_dir()));
    let mut page = session.new_page(&profile).await.unwrap();
    let url = format!("{}{CATALOG_PATH}", server.uri());
    page.navigate(&NavigationRequest {
        url: url.clone(),
        cookies: Vec::new(),
        timeout: std::time::Duration::from_secs(5),
    })
    .await
    .unwrap();

    assert_eq!(page.url(), url);
    assert!(page.content().await.unwrap().contains("Lacalut"));
    page.close().await;
}
