use crate::config::types::{Config, FallbackBackend, FallbackConfig, DEFAULT_PENDING_TABLE};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding the ingestion endpoint
pub const ENV_INGEST_URL: &str = "NEWSBOT_INGEST_URL";
/// Environment variable holding the backing-store base URL
pub const ENV_STORE_URL: &str = "SUPABASE_URL";
/// Environment variable holding the elevated store credential
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_LOOKBACK_HOURS: &str = "NEWSBOT_LOOKBACK_HOURS";
pub const ENV_PER_SOURCE_QUOTA: &str = "NEWSBOT_PER_SOURCE_QUOTA";
pub const ENV_GLOBAL_CAP: &str = "NEWSBOT_GLOBAL_CAP";
pub const ENV_HEADLESS: &str = "NEWSBOT_HEADLESS";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing and before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use newsbot::config::load_config;
///
/// let config = load_config(Path::new("newsbot.toml")).unwrap();
/// println!("Lookback: {}h", config.crawler.lookback_hours);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Parses TOML configuration text without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies environment overrides to a parsed configuration
///
/// `lookup` resolves a variable name to its value; blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_INGEST_URL) {
        config.delivery.ingest_url = url.trim().to_string();
    }

    if let Some(hours) = get(ENV_LOOKBACK_HOURS) {
        config.crawler.lookback_hours = parse_number(ENV_LOOKBACK_HOURS, &hours)?;
    }

    if let Some(quota) = get(ENV_PER_SOURCE_QUOTA) {
        config.selection.per_source_quota = parse_number(ENV_PER_SOURCE_QUOTA, &quota)?;
    }

    if let Some(cap) = get(ENV_GLOBAL_CAP) {
        config.selection.global_cap = parse_number(ENV_GLOBAL_CAP, &cap)?;
    }

    if let Some(headless) = get(ENV_HEADLESS) {
        config.browser.headless = !matches!(
            headless.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        );
    }

    let store_url = get(ENV_STORE_URL);
    let service_key = get(ENV_SERVICE_KEY);

    match config.fallback.as_mut() {
        Some(fallback) => {
            if fallback.backend == FallbackBackend::Rest {
                if let Some(url) = store_url {
                    fallback.url = Some(url.trim().to_string());
                }
                if let Some(key) = service_key {
                    fallback.service_key = Some(key.trim().to_string());
                }
            }
        }
        None => {
            // A store URL alone is enough to turn on the rest fallback.
            if let Some(url) = store_url {
                config.fallback = Some(FallbackConfig {
                    backend: FallbackBackend::Rest,
                    url: Some(url.trim().to_string()),
                    service_key: service_key.map(|k| k.trim().to_string()),
                    table: DEFAULT_PENDING_TABLE.to_string(),
                    database_path: None,
                });
            }
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
