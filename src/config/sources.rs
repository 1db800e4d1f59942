//! Source registry
//!
//! Resolves the sources declared in the TOML config and the optional JSON feeds
//! file into an ordered list of [`SourceDefinition`]s.

use crate::config::types::{Config, SelectorRules, SourceEntry};
use crate::config::validation::validate_selector;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// How a source is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// RSS or Atom document
    Syndication,
    /// Client-rendered page read through a headless browser
    RenderedPage,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syndication => "syndication",
            Self::RenderedPage => "rendered-page",
        }
    }

    /// Parses an explicit kind label
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "syndication" | "rss" | "atom" | "feed" => Some(Self::Syndication),
            "rendered-page" | "rendered" | "html" | "page" => Some(Self::RenderedPage),
            _ => None,
        }
    }

    /// Resolves the kind of a source, inferring it from the URL when no
    /// recognised label is given
    ///
    /// Blog index pages rarely expose a feed, so URLs mentioning "blog" are
    /// treated as rendered pages.
    pub fn infer(label: Option<&str>, url: &str) -> Self {
        if let Some(kind) = label.and_then(Self::from_label) {
            return kind;
        }

        if url.to_ascii_lowercase().contains("blog") {
            Self::RenderedPage
        } else {
            Self::Syndication
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feed to crawl
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDefinition {
    /// Unique name within a run
    pub name: String,
    pub url: Url,
    pub kind: SourceKind,
    /// Site-specific extraction selectors (rendered pages only)
    pub rules: Option<SelectorRules>,
}

impl SourceDefinition {
    pub fn new(name: impl Into<String>, url: Url, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            url,
            kind,
            rules: None,
        }
    }

    pub fn with_rules(mut self, rules: SelectorRules) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Entry of the JSON feeds file
#[derive(Debug, Clone, Deserialize)]
struct FeedFileEntry {
    source_name: String,
    url: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Ordered, immutable list of sources for one run
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDefinition>,
}

impl SourceRegistry {
    /// Builds a registry, rejecting empty or duplicate names
    pub fn new(sources: Vec<SourceDefinition>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Source with URL '{}' has an empty name",
                    source.url
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate source name '{}'",
                    source.name
                )));
            }
        }
        Ok(Self { sources })
    }

    /// Loads the registry described by a config
    ///
    /// TOML `[[source]]` entries come first, followed by the entries of
    /// `sources-file`, each in declared order.
    ///
    /// # Arguments
    ///
    /// * `config` - The parsed configuration
    /// * `base_dir` - Directory against which a relative `sources-file` is resolved
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut sources = Vec::new();

        for entry in &config.sources {
            sources.push(resolve_entry(entry)?);
        }

        if let Some(file) = &config.sources_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                base_dir.join(file)
            };
            let content = std::fs::read_to_string(&path)?;
            sources.extend(parse_feeds_file(&content)?);
        }

        if sources.is_empty() {
            return Err(ConfigError::Validation(
                "At least one source must be configured".to_string(),
            ));
        }

        Self::new(sources)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceDefinition> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in registry order
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a SourceRegistry {
    type Item = &'a SourceDefinition;
    type IntoIter = std::slice::Iter<'a, SourceDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// Parses the JSON feeds file (`[{"source_name", "url", "type"}]`)
pub fn parse_feeds_file(content: &str) -> Result<Vec<SourceDefinition>, ConfigError> {
    let entries: Vec<FeedFileEntry> = serde_json::from_str(content)?;

    entries
        .into_iter()
        .map(|entry| {
            let url = parse_source_url(&entry.source_name, &entry.url)?;
            let kind = SourceKind::infer(entry.kind.as_deref(), &entry.url);
            Ok(SourceDefinition::new(entry.source_name.trim(), url, kind))
        })
        .collect()
}

fn resolve_entry(entry: &SourceEntry) -> Result<SourceDefinition, ConfigError> {
    let url = parse_source_url(&entry.name, &entry.url)?;

    if let Some(label) = &entry.kind {
        if SourceKind::from_label(label).is_none() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' has unknown kind '{}'",
                entry.name, label
            )));
        }
    }
    let kind = SourceKind::infer(entry.kind.as_deref(), &entry.url);

    let mut source = SourceDefinition::new(entry.name.trim(), url, kind);
    if let Some(rules) = &entry.rules {
        for (field, selector) in rules.entries() {
            validate_selector(selector).map_err(|e| {
                ConfigError::InvalidSelector(format!(
                    "source '{}' rule '{}': {}",
                    entry.name, field, e
                ))
            })?;
        }
        source = source.with_rules(rules.clone());
    }

    Ok(source)
}

fn parse_source_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid URL for source '{}': {}", name, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source '{}' must use http or https, got '{}'",
            name,
            url.scheme()
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;
    use std::io::Write;
    use tempfile::TempDir;

    fn source(name: &str, url: &str) -> SourceDefinition {
        SourceDefinition::new(name, Url::parse(url).unwrap(), SourceKind::Syndication)
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(SourceKind::from_label("rss"), Some(SourceKind::Syndication));
        assert_eq!(SourceKind::from_label("HTML"), Some(SourceKind::RenderedPage));
        assert_eq!(
            SourceKind::from_label("rendered-page"),
            Some(SourceKind::RenderedPage)
        );
        assert_eq!(SourceKind::from_label("podcast"), None);
    }

    #[test]
    fn test_kind_inferred_from_blog_url() {
        assert_eq!(
            SourceKind::infer(None, "https://www.sigsauer.com/blog"),
            SourceKind::RenderedPage
        );
        assert_eq!(
            SourceKind::infer(None, "https://a.example/rss"),
            SourceKind::Syndication
        );
    }

    #[test]
    fn test_explicit_kind_wins_over_inference() {
        assert_eq!(
            SourceKind::infer(Some("rss"), "https://blog.example/feed"),
            SourceKind::Syndication
        );
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = SourceRegistry::new(vec![
            source("FeedA", "https://a.example/rss"),
            source("FeedA", "https://b.example/rss"),
        ]);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = SourceRegistry::new(vec![source("  ", "https://a.example/rss")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_feeds_file() {
        let json = r#"[
            {"source_name": "Ammoland", "url": "https://www.ammoland.com/feed/", "type": "rss"},
            {"source_name": "Sig Sauer", "url": "https://www.sigsauer.com/blog", "type": "html"},
            {"source_name": "Glock", "url": "https://us.glock.com/en/blog"}
        ]"#;
        let sources = parse_feeds_file(json).unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].kind, SourceKind::Syndication);
        assert_eq!(sources[1].kind, SourceKind::RenderedPage);
        assert_eq!(sources[2].kind, SourceKind::RenderedPage);
    }

    #[test]
    fn test_feeds_file_rejects_bad_url() {
        let json = r#"[{"source_name": "Bad", "url": "not a url"}]"#;
        assert!(matches!(
            parse_feeds_file(json),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_feeds_file_rejects_non_http_scheme() {
        let json = r#"[{"source_name": "Ftp", "url": "ftp://files.example/feed"}]"#;
        assert!(parse_feeds_file(json).is_err());
    }

    #[test]
    fn test_from_config_orders_toml_before_file() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("feeds.json")).unwrap();
        file.write_all(br#"[{"source_name": "FromFile", "url": "https://f.example/rss"}]"#)
            .unwrap();

        let mut config = Config::with_ingest_url("https://ingest.example/news-ingest");
        config.sources_file = Some("feeds.json".into());
        config.sources.push(SourceEntry {
            name: "FromToml".to_string(),
            url: "https://t.example/rss".to_string(),
            kind: None,
            rules: None,
        });

        let registry = SourceRegistry::from_config(&config, dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["FromToml", "FromFile"]);
    }

    #[test]
    fn test_from_config_requires_sources() {
        let config = Config::with_ingest_url("https://ingest.example/news-ingest");
        let result = SourceRegistry::from_config(&config, Path::new("."));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_from_config_rejects_unknown_kind() {
        let mut config = Config::with_ingest_url("https://ingest.example/news-ingest");
        config.sources.push(SourceEntry {
            name: "Odd".to_string(),
            url: "https://o.example/".to_string(),
            kind: Some("carrier-pigeon".to_string()),
            rules: None,
        });
        assert!(SourceRegistry::from_config(&config, Path::new(".")).is_err());
    }

    #[test]
    fn test_from_config_rejects_bad_selector() {
        let mut config = Config::with_ingest_url("https://ingest.example/news-ingest");
        config.sources.push(SourceEntry {
            name: "Broken".to_string(),
            url: "https://b.example/news".to_string(),
            kind: Some("html".to_string()),
            rules: Some(SelectorRules {
                container: Some("div[[".to_string()),
                ..SelectorRules::default()
            }),
        });
        let result = SourceRegistry::from_config(&config, Path::new("."));
        assert!(matches!(result, Err(ConfigError::InvalidSelector(_))));
    }
}
