//! Configuration module for newsbot
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file, applying environment overrides, and building the source registry.
//!
//! # Example
//!
//! ```no_run
//! use newsbot::config::{load_config, SourceRegistry};
//! use std::path::Path;
//!
//! let path = Path::new("newsbot.toml");
//! let config = load_config(path).unwrap();
//! let registry = SourceRegistry::from_config(&config, Path::new(".")).unwrap();
//! println!("{} sources, lookback {}h", registry.len(), config.crawler.lookback_hours);
//! ```

mod parser;
mod sources;
mod types;
mod validation;

// Re-export types
pub use sources::{parse_feeds_file, SourceDefinition, SourceKind, SourceRegistry};
pub use types::{
    BrowserConfig, Config, CrawlerConfig, DeliveryConfig, FallbackBackend, FallbackConfig,
    SelectionConfig, SelectorRules, SourceEntry, DEFAULT_LOOKBACK_HOURS, DEFAULT_PENDING_TABLE,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    ENV_GLOBAL_CAP, ENV_HEADLESS, ENV_INGEST_URL, ENV_LOOKBACK_HOURS, ENV_PER_SOURCE_QUOTA,
    ENV_SERVICE_KEY, ENV_STORE_URL,
};
pub use validation::validate_selector;
