//! Newsbot: a news crawler and ingestion pipeline
//!
//! This crate fetches articles from syndication feeds and client-rendered pages,
//! normalizes them into a single item shape, selects a balanced batch, and
//! delivers it to a remote ingestion endpoint with a backing-store fallback.

pub mod config;
pub mod delivery;
pub mod fetch;
pub mod pipeline;
pub mod runner;
pub mod url;

use thiserror::Error;

/// Main error type for newsbot operations
#[derive(Debug, Error)]
pub enum NewsbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse feeds file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Errors raised while fetching a single source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("Feed parse error for {url}: {message}")]
    Feed { url: String, message: String },

    #[error("Browser error for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Extraction failed for {url}: {message}")]
    Extract { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the ingestion endpoint client
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Ingestion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ingestion endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors raised by a fallback store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Store misconfigured: {0}")]
    Config(String),

    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Result type alias for newsbot operations
pub type Result<T> = std::result::Result<T, NewsbotError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for fallback store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// Re-export commonly used types
pub use config::{Config, SourceDefinition, SourceKind, SourceRegistry};
pub use delivery::DeliveryOutcome;
pub use pipeline::CanonicalItem;
pub use runner::{RunSummary, Runner};
