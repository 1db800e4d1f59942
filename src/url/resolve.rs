use url::Url;

/// Resolves an href or src attribute to an absolute http(s) URL
///
/// Returns None if the value should be ignored:
/// - empty values and fragment-only anchors
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - values that do not resolve to an http(s) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use newsbot::url::resolve_link;
///
/// let base = Url::parse("https://example.com/news/").unwrap();
/// assert_eq!(
///     resolve_link("post-1", &base),
///     Some("https://example.com/news/post-1".to_string())
/// );
/// assert_eq!(resolve_link("mailto:a@b.c", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
