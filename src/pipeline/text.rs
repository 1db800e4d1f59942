//! Text cleanup shared by fetchers and the normalizer

use scraper::Html;

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts an HTML fragment to plain text
///
/// Entities are decoded and tags dropped without inserting spaces, so inline
/// markup inside a word (`P<sup>365</sup>`) keeps the word whole.
pub fn html_to_text(s: &str) -> String {
    if !s.contains('<') && !s.contains('&') {
        return collapse_whitespace(s);
    }
    let fragment = Html::parse_fragment(s);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Truncates to at most `max` characters on a char boundary
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}
