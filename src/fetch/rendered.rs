//! Rendered-page fetcher
//!
//! Client-rendered sites only show their article list after scripts run, so
//! the page is loaded in a browser and the resulting DOM is handed to a
//! [`DomainExtractor`](super::DomainExtractor).

use crate::config::SourceDefinition;
use crate::fetch::extract::{extract_items, ExtractorRegistry};
use crate::fetch::{Fetcher, PublishedHint, RawCandidate};
use crate::FetchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Markup of a page after client-side rendering
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects
    pub final_url: Url,
    pub html: String,
}

/// Loads a page and returns its rendered DOM
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> FetchResult<RenderedPage>;
}

/// Fetches rendered-page sources
pub struct RenderedPageFetcher {
    renderer: Arc<dyn PageRenderer>,
    extractors: ExtractorRegistry,
    max_items: usize,
}

impl RenderedPageFetcher {
    /// # Arguments
    ///
    /// * `renderer` - Browser (or stand-in) producing rendered markup
    /// * `extractors` - Extractor lookup for each source
    /// * `max_items` - Containers read per page
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        extractors: ExtractorRegistry,
        max_items: usize,
    ) -> Self {
        Self {
            renderer,
            extractors,
            max_items,
        }
    }
}

#[async_trait]
impl Fetcher for RenderedPageFetcher {
    async fn fetch(
        &self,
        source: &SourceDefinition,
        _cutoff: DateTime<Utc>,
    ) -> FetchResult<Vec<RawCandidate>> {
        let page = self.renderer.render(&source.url).await?;
        let fetched_at = Utc::now();

        let extractor = self.extractors.for_source(source);
        debug!(
            source = %source.name,
            extractor = extractor.name(),
            bytes = page.html.len(),
            "Extracting rendered page"
        );

        let items = extract_items(&page.html, &page.final_url, extractor.as_ref(), self.max_items)?;

        Ok(items
            .into_iter()
            .map(|item| RawCandidate {
                source_name: source.name.clone(),
                source_url: item.link,
                title: item.title,
                description: item.description,
                image_url: item.image,
                published: item
                    .date
                    .map(PublishedHint::Text)
                    .unwrap_or(PublishedHint::Missing),
                fetched_at,
            })
            .collect())
    }
}
