use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default freshness window: one week
pub const DEFAULT_LOOKBACK_HOURS: u64 = 168;

/// Default table receiving fallback inserts
pub const DEFAULT_PENDING_TABLE: &str = "pending_news";

/// Main configuration structure for newsbot
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional JSON feeds file, resolved relative to the config file
    #[serde(rename = "sources-file", default)]
    pub sources_file: Option<PathBuf>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub fallback: Option<FallbackConfig>,

    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
}

/// Crawl pacing and freshness configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum age of an item, in hours, relative to run time
    #[serde(rename = "lookback-hours", default = "default_lookback_hours")]
    pub lookback_hours: u64,

    /// Pause between two sources (milliseconds)
    #[serde(rename = "source-delay-ms", default = "default_source_delay_ms")]
    pub source_delay_ms: u64,

    /// Timeout for a single feed download
    #[serde(rename = "feed-timeout-secs", default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,

    /// User agent override for feeds and browser sessions
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

/// Hybrid selection policy
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    /// Maximum items kept per source
    #[serde(rename = "per-source-quota", default = "default_per_source_quota")]
    pub per_source_quota: usize,

    /// Maximum items delivered per run
    #[serde(rename = "global-cap", default = "default_global_cap")]
    pub global_cap: usize,
}

/// Headless browser configuration for rendered-page sources
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window; turn off to watch a scrape
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(
        rename = "navigation-timeout-secs",
        default = "default_navigation_timeout_secs"
    )]
    pub navigation_timeout_secs: u64,

    /// Extra wait after load for late client-side rendering
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Upper bound on candidate elements read from one page
    #[serde(rename = "max-items-per-page", default = "default_max_items_per_page")]
    pub max_items_per_page: usize,

    /// Path to a Chromium executable; auto-detected when unset
    #[serde(rename = "chrome-path", default)]
    pub chrome_path: Option<PathBuf>,
}

/// Remote ingestion endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    #[serde(rename = "ingest-url")]
    pub ingest_url: String,

    #[serde(rename = "timeout-secs", default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between two submissions (milliseconds)
    #[serde(rename = "item-delay-ms", default = "default_item_delay_ms")]
    pub item_delay_ms: u64,
}

/// Which backing store receives items the endpoint rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackBackend {
    /// PostgREST insert with the service-role key
    Rest,
    /// Local SQLite database
    Sqlite,
}

/// Fallback store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    pub backend: FallbackBackend,

    /// Base URL of the backing store (rest backend)
    #[serde(default)]
    pub url: Option<String>,

    /// Elevated credential (rest backend)
    #[serde(rename = "service-key", default)]
    pub service_key: Option<String>,

    #[serde(default = "default_pending_table")]
    pub table: String,

    /// Database file (sqlite backend)
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

/// A source as written in the TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub name: String,

    pub url: String,

    /// "syndication" or "rendered-page"; inferred when absent
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub rules: Option<SelectorRules>,
}

/// CSS selectors locating article fields inside a rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectorRules {
    /// Element wrapping one article card
    #[serde(default)]
    pub container: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub image: Option<String>,
}

impl SelectorRules {
    /// Iterates over (field, selector) pairs that are set
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("container", self.container.as_deref()),
            ("title", self.title.as_deref()),
            ("link", self.link.as_deref()),
            ("description", self.description.as_deref()),
            ("date", self.date.as_deref()),
            ("image", self.image.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, sel)| sel.map(|s| (field, s)))
    }
}

fn default_lookback_hours() -> u64 {
    DEFAULT_LOOKBACK_HOURS
}

fn default_source_delay_ms() -> u64 {
    500
}

fn default_feed_timeout_secs() -> u64 {
    10
}

fn default_per_source_quota() -> usize {
    3
}

fn default_global_cap() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

fn default_settle_ms() -> u64 {
    1500
}

fn default_max_items_per_page() -> usize {
    15
}

fn default_delivery_timeout_secs() -> u64 {
    15
}

fn default_item_delay_ms() -> u64 {
    300
}

fn default_pending_table() -> String {
    DEFAULT_PENDING_TABLE.to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            source_delay_ms: default_source_delay_ms(),
            feed_timeout_secs: default_feed_timeout_secs(),
            user_agent: None,
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            per_source_quota: default_per_source_quota(),
            global_cap: default_global_cap(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_secs: default_navigation_timeout_secs(),
            settle_ms: default_settle_ms(),
            max_items_per_page: default_max_items_per_page(),
            chrome_path: None,
        }
    }
}

impl DeliveryConfig {
    pub fn new(ingest_url: impl Into<String>) -> Self {
        Self {
            ingest_url: ingest_url.into(),
            timeout_secs: default_delivery_timeout_secs(),
            item_delay_ms: default_item_delay_ms(),
        }
    }
}

impl Config {
    /// A config with default sections and no sources
    pub fn with_ingest_url(ingest_url: impl Into<String>) -> Self {
        Self {
            sources_file: None,
            crawler: CrawlerConfig::default(),
            selection: SelectionConfig::default(),
            browser: BrowserConfig::default(),
            delivery: DeliveryConfig::new(ingest_url),
            fallback: None,
            sources: Vec::new(),
        }
    }
}
