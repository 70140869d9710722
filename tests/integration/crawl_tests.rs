//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small mock catalog and drive the
//! full crawl cycle end-to-end through the HTTP transport.

use shelfwalk::config::{CategoryEntry, Config, PolitenessConfig};
use shelfwalk::storage::{read_snapshot, JsonLedger, IdentifierLedger, LEDGER_FILENAME};
use shelfwalk::Coordinator;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_items = 2;
    config.crawler.max_pages = 1;
    config.crawler.image_retries = 2;
    config.crawler.image_backoff_ms = 0;
    config.politeness = PolitenessConfig::disabled();
    config.transport.page_timeout_secs = 5;
    config.transport.image_timeout_secs = 5;
    config.output.data_dir = data_dir.display().to_string();
    config.source.domains = vec!["127.0.0.1".to_string()];
    config.source.default_category = format!("{}/b?node=1", base_url);
    config
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_listing(server: &MockServer, keyword: &str, ids: &[&str]) {
    let items: String = ids
        .iter()
        .map(|id| format!(r#"<div data-asin="{id}"><a href="/item/dp/{id}?ref=sr">{id}</a></div>"#))
        .collect();

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", keyword))
        .respond_with(html(items))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: &str) {
    let body = format!(
        r#"<span id="productTitle">Item {id}</span>
        <span class="a-price"><span class="a-offscreen">{id},99 €</span></span>
        <img id="landingImage" src="/img/{id}.png">"#
    );

    Mock::given(method("GET"))
        .and(path(format!("/item/dp/{}", id)))
        .respond_with(html(body))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/img/{}.png", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(format!("png-{}", id).into_bytes())
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;
}

/// Category page with two subcategories, each listing three items
async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/b"))
        .and(query_param("node", "1"))
        .respond_with(html(
            r#"<nav>
                <a href="/s?k=phones">phones</a>
                <a href="/s?k=tablets">tablets</a>
                <a href="/gp/cart/view.html?i=cart">Cart contents</a>
            </nav>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    mount_listing(server, "phones", &["P1", "P2", "P3"]).await;
    mount_listing(server, "tablets", &["T1", "T2", "T3"]).await;
}

#[tokio::test]
async fn test_full_crawl_and_rerun() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_catalog(&mock_server).await;
    for id in ["P1", "P2", "P3", "T1", "T2", "T3"] {
        mount_item(&mock_server, id).await;
    }

    let data = TempDir::new().expect("Failed to create temp dir");
    let root = data.path().join("run");
    let coordinator = Coordinator::new(create_test_config(&base_url, data.path()));
    let category = format!("{}/b?node=1", base_url);

    let summary = coordinator.crawl_category(&category, Some(&root), None).await;

    assert_eq!(
        summary.as_tuples(),
        vec![
            ("phones", format!("{}/s?k=phones", base_url).as_str(), 2),
            ("tablets", format!("{}/s?k=tablets", base_url).as_str(), 2),
        ]
    );

    let phones = read_snapshot(&root.join("phones/products.json")).expect("phones snapshot");
    assert_eq!(phones.len(), 2);
    assert_eq!(phones[0].identifier(), "P1");
    assert_eq!(phones[0].name(), "Item P1");
    assert_eq!(phones[0].price(), Some("P1,99 €"));
    assert_eq!(
        phones[0].source_url(),
        format!("{}/item/dp/P1", base_url)
    );
    assert_eq!(phones[0].collection(), "phones");

    let image = root.join("phones/images/Item_P1_P1.png");
    assert_eq!(std::fs::read(&image).expect("image stored"), b"png-P1");
    assert_eq!(phones[0].image_local(), Some(image.display().to_string().as_str()));

    let ledger = JsonLedger::open(&root);
    assert!(ledger.is_processed("P2"));
    assert!(!ledger.is_processed("P3"));
    assert_eq!(ledger.identifiers("tablets").len(), 2);
    drop(ledger);

    // Second run: nothing new, snapshots still complete
    let second = coordinator.crawl_category(&category, Some(&root), None).await;
    assert_eq!(second.total_saved(), 0);
    assert_eq!(second.len(), 2);
    let tablets = read_snapshot(&root.join("tablets/products.json")).expect("tablets snapshot");
    assert_eq!(tablets.len(), 2);
}

#[tokio::test]
async fn test_foreign_category_is_refused() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_catalog(&mock_server).await;

    let data = TempDir::new().expect("Failed to create temp dir");
    let mut config = create_test_config(&base_url, data.path());
    config.source.domains = vec!["*.amazon.fr".to_string()];
    let coordinator = Coordinator::new(config);

    let summary = coordinator
        .crawl_category(&format!("{}/b?node=1", base_url), None, None)
        .await;

    assert!(summary.is_empty());
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
    assert!(!coordinator.categories_root().exists());
}

#[tokio::test]
async fn test_item_failures_and_image_retries() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_listing(&mock_server, "phones", &["P1", "P2", "P3"]).await;

    // P1: image fails twice with 503, then succeeds
    Mock::given(method("GET"))
        .and(path("/img/P1.png"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_item(&mock_server, "P1").await;

    // P2: detail page is broken
    Mock::given(method("GET"))
        .and(path("/item/dp/P2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // P3: image is gone for good
    Mock::given(method("GET"))
        .and(path("/img/P3.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_item(&mock_server, "P3").await;

    let data = TempDir::new().expect("Failed to create temp dir");
    let coordinator = Coordinator::new(create_test_config(&base_url, data.path()));
    let category = format!("{}/s?k=phones", base_url);

    let summary = coordinator.crawl_category(&category, None, None).await;

    // No subcategories: the listing itself is the unit
    assert_eq!(summary.as_tuples(), vec![("phones", category.as_str(), 2)]);

    let unit_dir = coordinator.categories_root().join("phones");
    let records = read_snapshot(&unit_dir.join("products.json")).expect("snapshot");
    let ids: Vec<_> = records.iter().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["P1", "P3"]);

    assert!(records[0].image_local().is_some());
    assert!(unit_dir.join("images/Item_P1_P1.png").is_file());
    assert_eq!(records[1].image_local(), None);
}

#[tokio::test]
async fn test_batch_run_shares_one_ledger() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_catalog(&mock_server).await;
    mount_listing(&mock_server, "lampes", &["P1", "L1"]).await;
    for id in ["P1", "P2", "P3", "T1", "T2", "T3", "L1"] {
        mount_item(&mock_server, id).await;
    }

    let data = TempDir::new().expect("Failed to create temp dir");
    let coordinator = Coordinator::new(create_test_config(&base_url, data.path()));
    let categories = vec![
        CategoryEntry::new("tech", format!("{}/b?node=1", base_url)),
        CategoryEntry::new("maison", format!("{}/s?k=lampes", base_url)),
    ];

    let summary = coordinator.crawl_batch(&categories, None).await;

    let names: Vec<_> = summary.outcomes().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["tech_phones", "tech_tablets", "maison"]);
    assert_eq!(summary.total_saved(), 5);

    let root = coordinator.batch_root();
    assert!(root.join(LEDGER_FILENAME).is_file());
    assert!(root.join("maison/maison/products.json").is_file());
    assert!(root.join("tech/tablets/images").is_dir());
}
