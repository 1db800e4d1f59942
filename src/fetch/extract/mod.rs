//! Item extraction from rendered markup
//!
//! An extractor knows where article teasers live on a page and how to read
//! each field out of one. The [`ExtractorRegistry`] picks an extractor per
//! source: configured rules first, then a built-in extractor for the host,
//! then the generic heuristics.

mod generic;
mod sites;

pub use generic::{background_image, GenericExtractor, GENERIC_CONTAINER};
pub use sites::{danieldefense, glock, sigsauer, DanielDefenseExtractor, RuleExtractor};

use crate::config::SourceDefinition;
use crate::pipeline::text::truncate_chars;
use crate::url::{host_key, resolve_link};
use crate::{FetchError, FetchResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Characters of container text used when no description element exists
pub const DESCRIPTION_FALLBACK_CHARS: usize = 200;

/// One teaser read from a page, links and images already absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw date text, parsed later
    pub date: Option<String>,
    pub image: Option<String>,
}

/// Reads article teasers out of a page
///
/// Field methods receive one container element and return raw values;
/// relative URLs are resolved by [`extract_items`]. The defaults are the
/// generic heuristics.
pub trait DomainExtractor: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &str;

    /// CSS selector matching one container per item
    fn container(&self) -> &str;

    fn title(&self, item: ElementRef<'_>) -> Option<String> {
        generic::title(item)
    }

    fn link(&self, item: ElementRef<'_>) -> Option<String> {
        generic::link(item)
    }

    fn description(&self, item: ElementRef<'_>) -> Option<String> {
        generic::description(item)
    }

    fn date(&self, item: ElementRef<'_>) -> Option<String> {
        generic::date(item)
    }

    fn image(&self, item: ElementRef<'_>) -> Option<String> {
        generic::image_of(item)
    }
}

/// Extractors keyed on host (without `www.`)
#[derive(Clone)]
pub struct ExtractorRegistry {
    by_host: HashMap<String, Arc<dyn DomainExtractor>>,
    generic: Arc<dyn DomainExtractor>,
}

impl ExtractorRegistry {
    /// A registry with no host-specific extractors
    pub fn new() -> Self {
        Self {
            by_host: HashMap::new(),
            generic: Arc::new(GenericExtractor),
        }
    }

    /// A registry preloaded with the built-in site extractors
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("sigsauer.com", Arc::new(sigsauer()));
        registry.register("glock.com", Arc::new(glock()));
        registry.register("danieldefense.com", Arc::new(danieldefense()));
        registry
    }

    /// Registers an extractor for a host and its subdomains
    pub fn register(&mut self, host: &str, extractor: Arc<dyn DomainExtractor>) {
        let host = host.trim().to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        self.by_host.insert(host, extractor);
    }

    /// Picks the extractor for a source
    ///
    /// Rules on the source win. Otherwise the host is looked up, then each
    /// parent domain (`us.glock.com` falls back to `glock.com`).
    pub fn for_source(&self, source: &SourceDefinition) -> Arc<dyn DomainExtractor> {
        if let Some(rules) = &source.rules {
            return Arc::new(RuleExtractor::new(source.name.clone(), rules.clone()));
        }

        if let Some(host) = host_key(&source.url) {
            let mut candidate = host.as_str();
            loop {
                if let Some(extractor) = self.by_host.get(candidate) {
                    return Arc::clone(extractor);
                }
                match candidate.split_once('.') {
                    Some((_, parent)) if parent.contains('.') => candidate = parent,
                    _ => break,
                }
            }
        }

        Arc::clone(&self.generic)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Extracts up to `max_items` teasers from a page
///
/// Containers nested inside an earlier container are skipped, as are
/// containers without a title. Links default to the page URL; a `<base href>`
/// in the document overrides `page_url` for resolution.
///
/// # Arguments
///
/// * `html` - Rendered page markup
/// * `page_url` - Final URL of the page
/// * `extractor` - Extractor chosen for the source
/// * `max_items` - Maximum number of containers considered
///
/// # Returns
///
/// * `Ok(Vec<ExtractedItem>)` - Items in document order
/// * `Err(FetchError::Extract)` - The container selector does not parse
pub fn extract_items(
    html: &str,
    page_url: &Url,
    extractor: &dyn DomainExtractor,
    max_items: usize,
) -> FetchResult<Vec<ExtractedItem>> {
    let container = Selector::parse(extractor.container()).map_err(|e| FetchError::Extract {
        url: page_url.to_string(),
        message: format!(
            "invalid container selector '{}' for {}: {}",
            extractor.container(),
            extractor.name(),
            e
        ),
    })?;

    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    let matches: Vec<ElementRef<'_>> = document.select(&container).collect();
    let ids: HashSet<_> = matches.iter().map(|e| e.id()).collect();

    let items = matches
        .iter()
        .filter(|element| !element.ancestors().any(|a| ids.contains(&a.id())))
        .take(max_items)
        .filter_map(|element| read_item(*element, extractor, &base, page_url))
        .collect();

    Ok(items)
}

fn read_item(
    element: ElementRef<'_>,
    extractor: &dyn DomainExtractor,
    base: &Url,
    page_url: &Url,
) -> Option<ExtractedItem> {
    let title = extractor.title(element).filter(|t| !t.is_empty())?;

    let link = extractor
        .link(element)
        .and_then(|href| resolve_link(&href, base))
        .unwrap_or_else(|| page_url.to_string());

    let description = extractor
        .description(element)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            truncate_chars(&generic::card_text(element), DESCRIPTION_FALLBACK_CHARS)
        });

    let image = extractor
        .image(element)
        .and_then(|src| resolve_link(&src, base));

    Some(ExtractedItem {
        title,
        link,
        description,
        date: extractor.date(element),
        image,
    })
}

fn document_base(document: &Html, page_url: &Url) -> Url {
    let href = Selector::parse("base[href]").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .and_then(|b| b.value().attr("href"))
            .map(str::to_string)
    });

    href.and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}
