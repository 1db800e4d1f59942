use url::Url;

/// Extracts the lookup key for a URL's site
///
/// The host is lowercased and a leading `www.` is dropped, so
/// `https://www.Glock.com/news` and `https://glock.com/` share a key.
///
/// # Returns
///
/// * `Some(String)` - The normalized host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use newsbot::url::host_key;
///
/// let url = Url::parse("https://www.SigSauer.com/blog").unwrap();
/// assert_eq!(host_key(&url), Some("sigsauer.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => host,
        }
    })
}
