//! HTTP client construction
//!
//! Feed downloads and endpoint submissions share the same client setup:
//! browser-like user agent, bounded timeouts, compressed transfer.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;

/// User agent sent when none is configured
///
/// Several publisher sites reject obvious bot agents, so a desktop Chrome
/// string is used.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Returns the configured user agent or the default
pub fn effective_user_agent(config: &CrawlerConfig) -> &str {
    config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Overall per-request timeout (connect through body)
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use newsbot::fetch::{build_http_client, DEFAULT_USER_AGENT};
///
/// let client = build_http_client(DEFAULT_USER_AGENT, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(DEFAULT_USER_AGENT, Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn test_effective_user_agent() {
        let mut config = CrawlerConfig::default();
        assert_eq!(effective_user_agent(&config), DEFAULT_USER_AGENT);

        config.user_agent = Some("NewsBot/1.0".to_string());
        assert_eq!(effective_user_agent(&config), "NewsBot/1.0");
    }
}
