//! Heuristic extraction for pages without a dedicated extractor
//!
//! The helpers here double as the per-field fallbacks of every other
//! extractor.

use super::DomainExtractor;
use crate::pipeline::text::collapse_whitespace;
use scraper::{ElementRef, Selector};

/// Containers that usually wrap one article teaser
pub const GENERIC_CONTAINER: &str = "article, .post, .card, .news-item, .blog-post, .entry";

const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

/// Extractor used when neither rules nor a built-in extractor apply
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericExtractor;

impl DomainExtractor for GenericExtractor {
    fn name(&self) -> &str {
        "generic"
    }

    fn container(&self) -> &str {
        GENERIC_CONTAINER
    }
}

/// Returns the first descendant matching `css`
///
/// Invalid selectors match nothing.
pub(crate) fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let found = element.select(&selector).next();
    found
}

/// Collapsed text content of an element
///
/// Text nodes are concatenated, so `P<sup>365</sup>` reads as `P365`.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of a whole card, with a space between every text node
pub(crate) fn card_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Text of the first non-empty match of `css`
pub(crate) fn first_text(element: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let text = element
        .select(&selector)
        .map(element_text)
        .find(|t| !t.is_empty());
    text
}

pub(crate) fn title(element: ElementRef<'_>) -> Option<String> {
    first_text(element, "h1, h2, h3")
}

/// The href of `element` itself when it is a link, else of its first link
pub(crate) fn href_within(element: ElementRef<'_>) -> Option<String> {
    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href") {
            return Some(href.trim().to_string());
        }
    }
    select_first(element, "a[href]")
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
}

pub(crate) fn link(element: ElementRef<'_>) -> Option<String> {
    // A link inside the heading beats "read more" or category links
    select_first(element, "h1 a[href], h2 a[href], h3 a[href]")
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .or_else(|| href_within(element))
}

pub(crate) fn description(element: ElementRef<'_>) -> Option<String> {
    first_text(element, "p")
}

/// The `datetime` attribute of `element`, else its text
pub(crate) fn date_of(element: ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("datetime")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .or_else(|| non_empty(element_text(element)))
}

pub(crate) fn date(element: ElementRef<'_>) -> Option<String> {
    select_first(element, "time[datetime]")
        .and_then(date_of)
        .or_else(|| first_text(element, "time"))
}

/// Image URL carried by an `img` element's source attributes
pub(crate) fn img_attr(element: ElementRef<'_>) -> Option<String> {
    IMAGE_ATTRS.iter().find_map(|attr| {
        element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.starts_with("data:"))
            .map(str::to_string)
    })
}

/// Image of an element: its own attributes when it is an `img`, else the
/// first usable descendant `img`, else an inline background image
pub(crate) fn image_of(element: ElementRef<'_>) -> Option<String> {
    if element.value().name() == "img" {
        if let Some(src) = img_attr(element) {
            return Some(src);
        }
    }

    if let Ok(selector) = Selector::parse("img") {
        if let Some(src) = element.select(&selector).find_map(img_attr) {
            return Some(src);
        }
    }

    styled_background(element)
}

/// First `background-image: url(...)` on the element or a descendant
pub(crate) fn styled_background(element: ElementRef<'_>) -> Option<String> {
    if let Some(url) = element.value().attr("style").and_then(background_image) {
        return Some(url);
    }
    let selector = Selector::parse("[style]").ok()?;
    let url = element
        .select(&selector)
        .filter_map(|e| e.value().attr("style"))
        .find_map(background_image);
    url
}

/// Pulls the URL out of a CSS `background` or `background-image` declaration
///
/// # Example
///
/// ```
/// use newsbot::fetch::background_image;
///
/// let style = "background-image: url('/img/hero.jpg'); color: red";
/// assert_eq!(background_image(style), Some("/img/hero.jpg".to_string()));
/// ```
pub fn background_image(style: &str) -> Option<String> {
    let lower = style.to_ascii_lowercase();
    let start = lower.find("background")?;
    let open = lower[start..].find("url(")? + start + "url(".len();
    let close = lower[open..].find(')')? + open;

    let url = style[open..close]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    non_empty(url.to_string())
}
