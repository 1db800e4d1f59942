//! End-to-end runs against mock feed, ingestion and store servers

use crate::common::{
    fetchers, registry, rss_document, syndication_source, CaptureLayer, FeedEntry,
};
use chrono::{Duration as ChronoDuration, Utc};
use newsbot::config::{FallbackBackend, FallbackConfig, SourceDefinition, SourceKind};
use newsbot::delivery::{open_store, Deliverer, IngestClient, RestPendingStore, SqlitePendingStore};
use newsbot::pipeline::{FreshnessFilter, SelectionPolicy};
use newsbot::Runner;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn mount_feed(server: &MockServer, route: &str, entries: &[FeedEntry]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(rss_document(entries)),
        )
        .mount(server)
        .await;
}

async fn mount_ingest(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "status": "ok",
            "inserted": 1,
        })))
        .mount(server)
        .await;
}

/// Bodies POSTed to the ingestion path, in arrival order
async fn ingested(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r: &&Request| r.url.path() == "/ingest")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

fn deliverer(server: &MockServer, fallback: Option<Arc<dyn newsbot::delivery::PendingStore>>) -> Deliverer {
    Deliverer::new(
        IngestClient::new(reqwest::Client::new(), format!("{}/ingest", server.uri())),
        fallback,
        Duration::ZERO,
    )
}

fn runner(sources: Vec<SourceDefinition>, html: &str) -> Runner {
    Runner::new(
        registry(sources),
        fetchers(html),
        FreshnessFilter::from_hours(168),
        SelectionPolicy::new(3, 20),
    )
}

#[tokio::test]
async fn test_stale_entries_never_reach_endpoint() {
    let server = MockServer::start().await;
    let now = Utc::now();
    let fresh = now - ChronoDuration::hours(2);
    let stale = now - ChronoDuration::days(10);

    mount_feed(
        &server,
        "/rss",
        &[
            FeedEntry::new("One", "https://a.example/1", fresh),
            FeedEntry::new("Old one", "https://a.example/old-1", stale),
            FeedEntry::new("Two", "https://a.example/2", fresh - ChronoDuration::hours(1)),
            FeedEntry::new("Old two", "https://a.example/old-2", stale),
            FeedEntry::new("Three", "https://a.example/3", fresh - ChronoDuration::hours(2)),
        ],
    )
    .await;
    mount_ingest(&server, 200).await;

    let source = syndication_source("FeedA", &format!("{}/rss", server.uri()));
    let runner = runner(vec![source], "").with_deliverer(deliverer(&server, None));

    let summary = runner.run().await;

    let bodies = ingested(&server).await;
    let titles: Vec<_> = bodies.iter().map(|b| b["title_raw"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);
    assert_eq!(bodies[0]["source_name"], "FeedA");
    assert_eq!(bodies[0]["source_url"], "https://a.example/1");
    assert_eq!(bodies[0]["content_raw"], "About One");
    assert_eq!(bodies[0]["hash"].as_str().unwrap().len(), 16);
    assert!(bodies[0]["published_at"].is_string());

    assert_eq!(summary.selected, 3);
    assert_eq!(summary.delivered, 3);
    assert_eq!(summary.dropped, 0);
}

#[tokio::test]
async fn test_failing_source_does_not_affect_others() {
    let capture = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    let fresh = Utc::now() - ChronoDuration::hours(1);

    mount_feed(
        &server,
        "/a",
        &[
            FeedEntry::new("A1", "https://a.example/1", fresh),
            FeedEntry::new("A2", "https://a.example/2", fresh),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_feed(
        &server,
        "/c",
        &[FeedEntry::new("C1", "https://c.example/1", fresh)],
    )
    .await;
    mount_ingest(&server, 200).await;

    let sources = vec![
        syndication_source("A", &format!("{}/a", server.uri())),
        syndication_source("B", &format!("{}/b", server.uri())),
        syndication_source("C", &format!("{}/c", server.uri())),
    ];
    let runner = runner(sources, "").with_deliverer(deliverer(&server, None));

    let summary = runner.run().await;

    let titles: Vec<_> = ingested(&server)
        .await
        .iter()
        .map(|b| b["title_raw"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["A1", "A2", "C1"]);

    let errors = capture.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("source"), Some("B"));
    assert!(errors[0].field("error").unwrap().contains("500"));

    assert_eq!(summary.failed_sources(), 1);
    assert_eq!(summary.sources[1].name, "B");
    assert_eq!(summary.delivered, 3);
}

#[tokio::test]
async fn test_rendered_and_syndication_sources_share_quota() {
    let server = MockServer::start().await;
    let fresh = Utc::now() - ChronoDuration::hours(1);

    mount_feed(
        &server,
        "/rss",
        &(1..=5)
            .map(|i| FeedEntry::new(&format!("Feed {}", i), &format!("https://a.example/{}", i), fresh))
            .collect::<Vec<_>>(),
    )
    .await;
    mount_ingest(&server, 200).await;

    let html = r#"<html><body>
        <article><h2><a href="/news/1">Page 1</a></h2><p>First</p></article>
        <article><h2><a href="/news/2">Page 2</a></h2><p>Second</p></article>
    </body></html>"#;

    let sources = vec![
        SourceDefinition::new(
            "Page",
            Url::parse("https://page.example/news").unwrap(),
            SourceKind::RenderedPage,
        ),
        syndication_source("Feed", &format!("{}/rss", server.uri())),
    ];
    let runner = runner(sources, html).with_deliverer(deliverer(&server, None));

    let summary = runner.run().await;

    let bodies = ingested(&server).await;
    let titles: Vec<_> = bodies.iter().map(|b| b["title_raw"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Page 1", "Page 2", "Feed 1", "Feed 2", "Feed 3"]);
    assert_eq!(bodies[0]["source_url"], "https://page.example/news/1");
    assert_eq!(summary.over_quota, 2);
}

#[tokio::test]
async fn test_rejected_item_goes_to_rest_fallback_once() {
    let server = MockServer::start().await;
    let published = Utc::now() - ChronoDuration::hours(1);

    mount_feed(
        &server,
        "/rss",
        &[FeedEntry::new("Only", "https://a.example/only", published)],
    )
    .await;
    mount_ingest(&server, 500).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/pending_news"))
        .and(header("apikey", "service-key"))
        .and(body_partial_json(serde_json::json!({
            "source_name": "FeedA",
            "source_url": "https://a.example/only",
            "title_raw": "Only",
            "content_raw": "About Only",
            "processed": false,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestPendingStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-key",
        "pending_news",
    );
    let source = syndication_source("FeedA", &format!("{}/rss", server.uri()));
    let runner = runner(vec![source], "").with_deliverer(deliverer(&server, Some(Arc::new(store))));

    let summary = runner.run().await;

    let rows: Vec<Value> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/rest/v1/pending_news")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(rows.len(), 1);
    for field in ["hash", "image_url", "published_at", "fetched_at"] {
        assert!(rows[0].get(field).is_some(), "missing {}", field);
    }

    assert_eq!(summary.delivered, 0);
    assert_eq!(summary.fallback_delivered, 1);
    assert_eq!(summary.dropped, 0);
}

#[tokio::test]
async fn test_sqlite_fallback_keeps_one_row_per_hash() {
    let server = MockServer::start().await;
    let published = Utc::now() - ChronoDuration::hours(1);

    mount_feed(
        &server,
        "/rss",
        &[
            FeedEntry::new("First", "https://a.example/1", published),
            FeedEntry::new("Second", "https://a.example/2", published),
        ],
    )
    .await;
    mount_ingest(&server, 503).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("pending.db");
    let config = FallbackConfig {
        backend: FallbackBackend::Sqlite,
        url: None,
        service_key: None,
        table: "pending_news".to_string(),
        database_path: Some(db_path.to_string_lossy().into_owned()),
    };
    let store = open_store(&config, reqwest::Client::new(), dir.path()).unwrap();
    assert_eq!(store.name(), "sqlite");

    // Two runs over the same feed
    for _ in 0..2 {
        let source = syndication_source("FeedA", &format!("{}/rss", server.uri()));
        let runner = runner(vec![source], "").with_deliverer(deliverer(&server, Some(store.clone())));
        let summary = runner.run().await;
        assert_eq!(summary.fallback_delivered, 2);
    }

    let reopened = SqlitePendingStore::new(&db_path).unwrap();
    assert_eq!(reopened.count_pending().unwrap(), 2);
}
