//! Shared fixtures for the integration tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newsbot::config::{SourceDefinition, SourceKind, SourceRegistry};
use newsbot::fetch::{
    ExtractorRegistry, FetcherSet, PageRenderer, RenderedPage, RenderedPageFetcher,
    SyndicationFetcher,
};
use newsbot::FetchResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use url::Url;

/// One entry of a test RSS document
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

impl FeedEntry {
    pub fn new(title: &str, link: &str, published: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            published,
        }
    }
}

/// Renders an RSS 2.0 document
pub fn rss_document(entries: &[FeedEntry]) -> String {
    let items: String = entries
        .iter()
        .map(|entry| {
            format!(
                "<item><title>{}</title><link>{}</link><description>About {}</description><pubDate>{}</pubDate></item>",
                entry.title,
                entry.link,
                entry.title,
                entry.published.to_rfc2822()
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://test.example</link><description>Test feed</description>{}</channel></rss>"#,
        items
    )
}

pub fn syndication_source(name: &str, url: &str) -> SourceDefinition {
    SourceDefinition::new(name, Url::parse(url).unwrap(), SourceKind::Syndication)
}

pub fn registry(sources: Vec<SourceDefinition>) -> SourceRegistry {
    SourceRegistry::new(sources).unwrap()
}

/// Serves fixed markup for every URL
pub struct StaticRenderer {
    pub html: String,
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    async fn render(&self, url: &Url) -> FetchResult<RenderedPage> {
        Ok(RenderedPage {
            final_url: url.clone(),
            html: self.html.clone(),
        })
    }
}

/// Real syndication fetcher plus a rendered fetcher backed by `html`
pub fn fetchers(html: &str) -> FetcherSet {
    let syndication = SyndicationFetcher::new(reqwest::Client::new(), Duration::from_secs(5));
    let rendered = RenderedPageFetcher::new(
        Arc::new(StaticRenderer {
            html: html.to_string(),
        }),
        ExtractorRegistry::with_builtin(),
        15,
    );
    FetcherSet::new(Box::new(syndication), Box::new(rendered))
}

/// A log event reduced to its level and fields
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{:?}", value));
    }
}

/// Layer recording every event it sees
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == Level::ERROR)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}
