//! Selector-driven extractors
//!
//! [`RuleExtractor`] applies a [`SelectorRules`] set, falling back to the
//! generic heuristics field by field. The built-in extractors for known
//! publisher sites are rule sets of their own.

use super::generic::{self, date_of, element_text, href_within, image_of, select_first};
use super::DomainExtractor;
use crate::config::SelectorRules;
use scraper::{ElementRef, Selector};

/// Extractor driven by configured CSS selectors
#[derive(Debug, Clone)]
pub struct RuleExtractor {
    name: String,
    rules: SelectorRules,
}

impl RuleExtractor {
    pub fn new(name: impl Into<String>, rules: SelectorRules) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn rules(&self) -> &SelectorRules {
        &self.rules
    }

    /// Non-empty text of the first match of an optional rule
    fn rule_text(&self, element: ElementRef<'_>, rule: &Option<String>) -> Option<String> {
        let css = rule.as_deref()?;
        let selector = Selector::parse(css).ok()?;
        let text = element
            .select(&selector)
            .map(element_text)
            .find(|t| !t.is_empty());
        text
    }

    fn rule_match<'a>(&self, element: ElementRef<'a>, rule: &Option<String>) -> Option<ElementRef<'a>> {
        rule.as_deref().and_then(|css| select_first(element, css))
    }
}

impl DomainExtractor for RuleExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self) -> &str {
        self.rules
            .container
            .as_deref()
            .unwrap_or(generic::GENERIC_CONTAINER)
    }

    fn title(&self, item: ElementRef<'_>) -> Option<String> {
        self.rule_text(item, &self.rules.title)
            .or_else(|| generic::title(item))
    }

    fn link(&self, item: ElementRef<'_>) -> Option<String> {
        self.rule_match(item, &self.rules.link)
            .and_then(href_within)
            .or_else(|| generic::link(item))
    }

    fn description(&self, item: ElementRef<'_>) -> Option<String> {
        self.rule_text(item, &self.rules.description)
            .or_else(|| generic::description(item))
    }

    fn date(&self, item: ElementRef<'_>) -> Option<String> {
        self.rule_match(item, &self.rules.date)
            .and_then(date_of)
            .or_else(|| generic::date(item))
    }

    fn image(&self, item: ElementRef<'_>) -> Option<String> {
        self.rule_match(item, &self.rules.image)
            .and_then(image_of)
            .or_else(|| image_of(item))
    }
}

fn rules(
    container: &str,
    title: &str,
    link: &str,
    description: &str,
    date: &str,
    image: &str,
) -> SelectorRules {
    SelectorRules {
        container: Some(container.to_string()),
        title: Some(title.to_string()),
        link: Some(link.to_string()),
        description: Some(description.to_string()),
        date: Some(date.to_string()),
        image: Some(image.to_string()),
    }
}

/// sigsauer.com blog listing
pub fn sigsauer() -> RuleExtractor {
    RuleExtractor::new(
        "sigsauer.com",
        rules(
            ".blog-item",
            ".blog-title a",
            ".blog-title a",
            ".blog-excerpt",
            ".blog-date",
            "img",
        ),
    )
}

/// glock.com press and news listings
pub fn glock() -> RuleExtractor {
    RuleExtractor::new(
        "glock.com",
        rules(
            ".press-release, .news-item, .article",
            "h2, .title, .heading",
            "a",
            "p, .summary, .excerpt",
            "time, .date",
            "img",
        ),
    )
}

/// danieldefense.com blog
///
/// Teaser images are lazy-loaded: the real URL sits in `data-original` on a
/// wrapper, on the `img` itself, or in an inline background.
#[derive(Debug, Clone)]
pub struct DanielDefenseExtractor {
    inner: RuleExtractor,
}

impl DanielDefenseExtractor {
    pub fn new() -> Self {
        Self {
            inner: RuleExtractor::new(
                "danieldefense.com",
                SelectorRules {
                    container: Some(".mfblogunveil, .post-list .item".to_string()),
                    title: Some(".post-title a, h2 a".to_string()),
                    link: Some(".post-title a".to_string()),
                    description: Some(".post-short-content p, .post-content p".to_string()),
                    date: Some("time, .post-meta time".to_string()),
                    image: None,
                },
            ),
        }
    }
}

/// Built-in extractor for danieldefense.com
pub fn danieldefense() -> DanielDefenseExtractor {
    DanielDefenseExtractor::new()
}

impl Default for DanielDefenseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainExtractor for DanielDefenseExtractor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn container(&self) -> &str {
        self.inner.container()
    }

    fn title(&self, item: ElementRef<'_>) -> Option<String> {
        self.inner.title(item)
    }

    fn link(&self, item: ElementRef<'_>) -> Option<String> {
        self.inner.link(item)
    }

    fn description(&self, item: ElementRef<'_>) -> Option<String> {
        self.inner.description(item)
    }

    fn date(&self, item: ElementRef<'_>) -> Option<String> {
        self.inner.date(item)
    }

    fn image(&self, item: ElementRef<'_>) -> Option<String> {
        let lazy = item
            .value()
            .attr("data-original")
            .or_else(|| {
                select_first(item, "[data-original]").and_then(|e| e.value().attr("data-original"))
            })
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        lazy.or_else(|| {
            select_first(item, "img[src]")
                .and_then(|img| img.value().attr("src"))
                .map(|src| src.trim().to_string())
        })
        .or_else(|| generic::styled_background(item))
    }
}
