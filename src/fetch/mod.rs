//! Fetchers turning one source definition into raw candidate items
//!
//! This module contains:
//! - The [`Fetcher`] trait and the [`RawCandidate`] record fetchers produce
//! - A syndication fetcher for RSS/Atom documents
//! - A rendered-page fetcher driving a headless browser
//! - Site-specific and generic extractors for rendered markup

mod browser;
mod extract;
mod http;
mod rendered;
mod syndication;

pub use browser::ChromeRenderer;
pub use extract::{
    background_image, extract_items, DanielDefenseExtractor, DomainExtractor, ExtractedItem,
    ExtractorRegistry, GenericExtractor, RuleExtractor,
};
pub use http::{build_http_client, effective_user_agent, DEFAULT_USER_AGENT};
pub use rendered::{PageRenderer, RenderedPage, RenderedPageFetcher};
pub use syndication::{parse_feed, SyndicationFetcher};

use crate::config::{SourceDefinition, SourceKind};
use crate::FetchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// What a fetcher knows about an item's publish time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedHint {
    /// Parsed by the fetcher
    At(DateTime<Utc>),
    /// Raw date text scraped from markup, parsed during normalization
    Text(String),
    /// Nothing published; the fetch time stands in
    Missing,
}

/// Fetcher output before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub source_name: String,
    /// Absolute article URL
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub published: PublishedHint,
    pub fetched_at: DateTime<Utc>,
}

/// A strategy for fetching one kind of source
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches candidates for a source
    ///
    /// `cutoff` is the freshness boundary; fetchers may drop older entries
    /// early but are not required to.
    async fn fetch(
        &self,
        source: &SourceDefinition,
        cutoff: DateTime<Utc>,
    ) -> FetchResult<Vec<RawCandidate>>;
}

/// The fetcher used for each source kind
pub struct FetcherSet {
    syndication: Box<dyn Fetcher>,
    rendered: Box<dyn Fetcher>,
}

impl FetcherSet {
    pub fn new(syndication: Box<dyn Fetcher>, rendered: Box<dyn Fetcher>) -> Self {
        Self {
            syndication,
            rendered,
        }
    }

    pub fn for_kind(&self, kind: SourceKind) -> &dyn Fetcher {
        match kind {
            SourceKind::Syndication => self.syndication.as_ref(),
            SourceKind::RenderedPage => self.rendered.as_ref(),
        }
    }
}
