//! Loading configuration and sources from disk

use newsbot::config::{load_config, FallbackBackend, SourceKind, SourceRegistry};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
sources-file = "rssFeeds.json"

[crawler]
lookback-hours = 48
source-delay-ms = 0

[selection]
per-source-quota = 2
global-cap = 10

[delivery]
ingest-url = "https://project.functions.example/news-ingest"

[fallback]
backend = "sqlite"
database-path = "pending.db"

[[source]]
name = "Sig Sauer"
url = "https://www.sigsauer.com/blog"

[source.rules]
container = ".blog-item"
title = ".blog-title a"
"#;

const FEEDS: &str = r#"[
  {"source_name": "Guns.com", "url": "https://www.guns.com/news/feed", "type": "rss"},
  {"source_name": "Glock", "url": "https://us.glock.com/en/press-releases", "type": "html"},
  {"source_name": "Ammoland", "url": "https://www.ammoland.com/feed/"}
]"#;

#[test]
fn test_registry_from_config_and_feeds_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("newsbot.toml");
    fs::write(&config_path, CONFIG).unwrap();
    fs::write(dir.path().join("rssFeeds.json"), FEEDS).unwrap();

    let config = load_config(&config_path).unwrap();
    assert_eq!(config.selection.per_source_quota, 2);
    assert_eq!(
        config.fallback.as_ref().map(|f| f.backend),
        Some(FallbackBackend::Sqlite)
    );

    let registry = SourceRegistry::from_config(&config, dir.path()).unwrap();
    assert_eq!(
        registry.names(),
        vec!["Sig Sauer", "Guns.com", "Glock", "Ammoland"]
    );

    let kinds: Vec<_> = registry.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SourceKind::RenderedPage,
            SourceKind::Syndication,
            SourceKind::RenderedPage,
            SourceKind::Syndication,
        ]
    );

    let rules = registry.iter().next().unwrap().rules.clone().unwrap();
    assert_eq!(rules.container.as_deref(), Some(".blog-item"));
}

#[test]
fn test_missing_feeds_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("newsbot.toml");
    fs::write(&config_path, CONFIG).unwrap();

    let config = load_config(&config_path).unwrap();
    assert!(SourceRegistry::from_config(&config, dir.path()).is_err());
}
