use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, DeliveryConfig, FallbackBackend, FallbackConfig,
    SelectionConfig,
};
use crate::delivery::is_plain_identifier;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_selection_config(&config.selection)?;
    validate_browser_config(&config.browser)?;
    validate_delivery_config(&config.delivery)?;
    if let Some(fallback) = &config.fallback {
        validate_fallback_config(fallback)?;
    }
    Ok(())
}

/// Checks that a CSS selector parses
pub fn validate_selector(selector: &str) -> Result<(), String> {
    if selector.trim().is_empty() {
        return Err("selector cannot be empty".to_string());
    }
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Validates crawl pacing configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.lookback_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "lookback_hours must be >= 1, got {}",
            config.lookback_hours
        )));
    }

    if config.feed_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "feed_timeout_secs must be >= 1, got {}",
            config.feed_timeout_secs
        )));
    }

    if let Some(ua) = &config.user_agent {
        if ua.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the hybrid selection policy
fn validate_selection_config(config: &SelectionConfig) -> Result<(), ConfigError> {
    if config.per_source_quota < 1 {
        return Err(ConfigError::Validation(format!(
            "per_source_quota must be >= 1, got {}",
            config.per_source_quota
        )));
    }

    if config.global_cap < 1 {
        return Err(ConfigError::Validation(format!(
            "global_cap must be >= 1, got {}",
            config.global_cap
        )));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_secs must be >= 1, got {}",
            config.navigation_timeout_secs
        )));
    }

    if config.max_items_per_page < 1 || config.max_items_per_page > 50 {
        return Err(ConfigError::Validation(format!(
            "max_items_per_page must be between 1 and 50, got {}",
            config.max_items_per_page
        )));
    }

    Ok(())
}

/// Validates the ingestion endpoint configuration
fn validate_delivery_config(config: &DeliveryConfig) -> Result<(), ConfigError> {
    validate_http_url("ingest_url", &config.ingest_url)?;

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "delivery timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates the fallback store configuration
fn validate_fallback_config(config: &FallbackConfig) -> Result<(), ConfigError> {
    if !is_plain_identifier(&config.table) {
        return Err(ConfigError::Validation(format!(
            "fallback table must be a plain identifier, got '{}'",
            config.table
        )));
    }

    match config.backend {
        FallbackBackend::Rest => {
            let url = config.url.as_deref().unwrap_or_default();
            if url.is_empty() {
                return Err(ConfigError::Validation(
                    "rest fallback requires a url".to_string(),
                ));
            }
            validate_http_url("fallback url", url)?;

            if config
                .service_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
            {
                return Err(ConfigError::Validation(
                    "rest fallback requires a service key".to_string(),
                ));
            }
        }
        FallbackBackend::Sqlite => {
            if config
                .database_path
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
            {
                return Err(ConfigError::Validation(
                    "sqlite fallback requires a database_path".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_http_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, raw
        )));
    }

    Ok(())
}
