//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end through the real HTTP fetcher.

use std::time::Duration;
use tempfile::TempDir;
use threadweave::config::{parse_config, Config, CrawlMode};
use threadweave::crawler::Coordinator;
use threadweave::output::CrawlSummary;
use threadweave::storage::{RecordStore, SqliteRecordStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast-polling test configuration crawling the mock server
fn create_test_config(mock_server: &MockServer, workers: usize, extra: &str) -> Config {
    let base_url = mock_server.uri();
    let domain = base_url.trim_start_matches("http://").to_string();

    parse_config(&format!(
        r#"
[crawler]
workers = {workers}
domain = "{domain}"
seeds = ["{base_url}/"]
pop-timeout-ms = 20
poll-interval-ms = 5
max-poll-interval-ms = 50

[retry]
max-attempts = 2
base-wait-secs = 0.0

{extra}
"#
    ))
    .expect("test config should be valid")
}

async fn crawl(config: Config) -> CrawlSummary {
    let coordinator = Coordinator::new(config)
        .await
        .expect("Failed to create coordinator");

    tokio::time::timeout(Duration::from_secs(30), coordinator.run())
        .await
        .expect("crawl did not terminate")
        .expect("crawl failed")
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&format!(
            r#"<a href="{}/page1">Page 1</a>
               <a href="/page2">Page 2</a>
               <a href="https://elsewhere.example.org/">Elsewhere</a>
               <a href="javascript:void(0)">Script</a>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page(r#"<a href="/">Home</a><a href="/page2">Page 2</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page(r#"<a href="/page1">Page 1</a><a href="/gone">Gone</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 4, "");
    let summary = crawl(config).await;

    assert_eq!(summary.visited, 4);
    assert_eq!(summary.claimed, 4);
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.fetch_failures, 1);
    // Mock expectations verify each page was requested exactly once
}

#[tokio::test]
async fn test_crawl_decodes_fallback_charset() {
    let mock_server = MockServer::start().await;

    // "中文" in GBK followed by a link, invalid as UTF-8
    let mut body = b"<html><body><p>".to_vec();
    body.extend_from_slice(&[0xD6, 0xD0, 0xCE, 0xC4]);
    body.extend_from_slice(b"</p><a href=\"/next\">next</a></body></html>");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page(""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &mock_server,
        2,
        r#"[fetch]
charsets = ["utf-8", "gbk"]"#,
    );
    let summary = crawl(config).await;

    assert_eq!(summary.fetched, 2);
}

#[tokio::test]
async fn test_server_errors_retried_then_abandoned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 2, "");
    let summary = crawl(config).await;

    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.visited, 1);
}

#[tokio::test]
async fn test_sample_extract_crawl_persists_record() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("records.db");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<a href="/html/lizhi/1.html">Detail</a><a href="/about.html">About</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Crawled once for links, fetched again when sampled
    Mock::given(method("GET"))
        .and(path("/html/lizhi/1.html"))
        .respond_with(html_page(
            r#"<div class="crumbs"><a href="/html/lizhi/index.html">Motivation</a></div>
               <div class="title"><h2>On persistence</h2></div>
               <div class="content">Keep going.</div>"#,
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/html/lizhi/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about.html"))
        .respond_with(html_page("About"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        &mock_server,
        1,
        &format!(
            r#"[output]
database-path = "{}""#,
            db_path.display()
        ),
    );
    config.crawler.mode = CrawlMode::SampleExtract;
    config.crawler.detail_path_pattern = Some("/html/*.html".to_string());

    let summary = crawl(config).await;
    assert_eq!(summary.records_stored, 1);

    let store = SqliteRecordStore::new(&db_path).expect("Failed to open database");
    assert_eq!(store.count().unwrap(), 1);

    let records = store.records().unwrap();
    let (url, record) = &records[0];
    assert_eq!(url, &format!("{}/html/lizhi/1.html", mock_server.uri()));
    assert_eq!(record.title, "Motivation");
    assert_eq!(record.sub_title, "On persistence");
    assert_eq!(record.content, "Keep going.");
}

#[tokio::test]
async fn test_second_coordinator_joins_instead_of_reseeding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 1, "");
    let coordinator = Coordinator::new(config).await.unwrap();
    let queue = coordinator.components().queue.clone();
    queue
        .push(&format!("{}/joined", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(coordinator.seed().await.unwrap(), 0);
    assert_eq!(queue.len().await.unwrap(), 1);
}
