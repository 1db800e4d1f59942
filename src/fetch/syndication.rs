//! Syndication (RSS/Atom) fetcher
//!
//! Downloads a feed document with a bounded timeout and maps every entry to a
//! [`RawCandidate`]. Parsing is delegated to `feed-rs`, which understands RSS
//! 0.9x/1.0/2.0, Atom and JSON Feed.

use crate::config::{CrawlerConfig, SourceDefinition};
use crate::fetch::http::{build_http_client, effective_user_agent};
use crate::fetch::{Fetcher, PublishedHint, RawCandidate};
use crate::pipeline::text::html_to_text;
use crate::url::resolve_link;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif"];

/// Fetches RSS/Atom sources over HTTP
pub struct SyndicationFetcher {
    client: Client,
    timeout: Duration,
}

impl SyndicationFetcher {
    /// Creates a fetcher around an existing client
    ///
    /// `timeout` is only used for error reporting; the client is expected to
    /// enforce it.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Builds a fetcher from the crawler settings
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.feed_timeout_secs);
        let client = build_http_client(effective_user_agent(config), timeout)?;
        Ok(Self::new(client, timeout))
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl Fetcher for SyndicationFetcher {
    async fn fetch(
        &self,
        source: &SourceDefinition,
        cutoff: DateTime<Utc>,
    ) -> FetchResult<Vec<RawCandidate>> {
        let url = source.url.as_str();
        debug!(source = %source.name, url, "Requesting feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(url, e))?;
        parse_feed(&body, source, Utc::now(), cutoff)
    }
}

/// Parses a feed document into candidates
///
/// Entries with a known publish time older than `cutoff` are skipped here so
/// that large archives do not flow through the rest of the pipeline.
///
/// # Arguments
///
/// * `body` - Raw feed bytes
/// * `source` - The source the feed belongs to
/// * `fetched_at` - Timestamp recorded on every candidate
/// * `cutoff` - Freshness boundary
pub fn parse_feed(
    body: &[u8],
    source: &SourceDefinition,
    fetched_at: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> FetchResult<Vec<RawCandidate>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| FetchError::Feed {
        url: source.url.to_string(),
        message: e.to_string(),
    })?;

    let total = feed.entries.len();
    let mut candidates = Vec::with_capacity(total);

    for entry in &feed.entries {
        let published = match entry.published.or(entry.updated) {
            Some(at) if at < cutoff => continue,
            Some(at) => PublishedHint::At(at),
            None => PublishedHint::Missing,
        };

        let title = entry
            .title
            .as_ref()
            .map(|t| html_to_text(&t.content))
            .unwrap_or_default();

        let description = entry
            .summary
            .as_ref()
            .map(|s| html_to_text(&s.content))
            .filter(|s| !s.is_empty())
            .or_else(|| {
                entry
                    .content
                    .as_ref()
                    .and_then(|c| c.body.as_deref())
                    .map(html_to_text)
            })
            .unwrap_or_default();

        candidates.push(RawCandidate {
            source_name: source.name.clone(),
            source_url: select_entry_link(entry, source),
            title,
            description,
            image_url: select_entry_image(entry, source),
            published,
            fetched_at,
        });
    }

    debug!(
        source = %source.name,
        entries = total,
        kept = candidates.len(),
        "Parsed feed"
    );

    Ok(candidates)
}

fn select_entry_link(entry: &Entry, source: &SourceDefinition) -> String {
    let alternate = entry
        .links
        .iter()
        .filter(|link| {
            link.rel
                .as_deref()
                .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .find_map(|link| resolve_link(&link.href, &source.url));

    alternate
        .or_else(|| {
            let id = entry.id.trim();
            if id.starts_with("http://") || id.starts_with("https://") {
                resolve_link(id, &source.url)
            } else {
                None
            }
        })
        .unwrap_or_else(|| source.url.to_string())
}

fn select_entry_image(entry: &Entry, source: &SourceDefinition) -> Option<String> {
    // Media content (including RSS enclosures) with an image type or extension
    for media in &entry.media {
        for content in &media.content {
            let Some(url) = content.url.as_ref() else {
                continue;
            };
            let is_image = content
                .content_type
                .as_ref()
                .map(|m| m.to_string().starts_with("image/"))
                .unwrap_or(false);
            if is_image || has_image_extension(url.as_str()) {
                return Some(url.to_string());
            }
        }
    }

    for media in &entry.media {
        for thumbnail in &media.thumbnails {
            if let Some(url) = resolve_link(&thumbnail.image.uri, &source.url) {
                return Some(url);
            }
        }
    }

    for link in &entry.links {
        let is_enclosure = link
            .rel
            .as_deref()
            .map_or(false, |rel| rel.eq_ignore_ascii_case("enclosure"));
        let is_image = link
            .media_type
            .as_deref()
            .map_or(false, |m| m.starts_with("image/"));
        if is_enclosure && (is_image || has_image_extension(&link.href)) {
            if let Some(url) = resolve_link(&link.href, &source.url) {
                return Some(url);
            }
        }
    }

    let markup = [
        entry.summary.as_ref().map(|s| s.content.as_str()),
        entry.content.as_ref().and_then(|c| c.body.as_deref()),
    ];
    markup
        .into_iter()
        .flatten()
        .find_map(|html| first_img_src(html, source))
}

fn first_img_src(html: &str, source: &SourceDefinition) -> Option<String> {
    if !html.contains("<img") {
        return None;
    }
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);
    let src = fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| resolve_link(src, &source.url));
    src
}

fn has_image_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
