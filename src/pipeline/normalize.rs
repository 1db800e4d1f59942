//! Normalization of raw candidates into canonical items

use crate::fetch::{PublishedHint, RawCandidate};
use crate::pipeline::text::collapse_whitespace;
use crate::pipeline::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest
pub const FINGERPRINT_LEN: usize = 16;

/// An item in the shape the ingestion endpoint accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub source_name: String,
    pub source_url: String,
    pub title_raw: String,
    pub content_raw: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Identity of the item across runs
    #[serde(rename = "hash")]
    pub fingerprint: String,
}

/// Why a candidate could not be normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyTitle,
    UnparseableDate(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => f.write_str("empty title"),
            Self::UnparseableDate(text) => write!(f, "unparseable date '{}'", text),
        }
    }
}

/// Computes the fingerprint of an item
///
/// SHA-256 over the title followed directly by the URL, hex encoded and cut
/// to [`FINGERPRINT_LEN`] characters. Hashes already in the store were
/// written with this layout, so it must not change.
///
/// # Example
///
/// ```
/// use newsbot::pipeline::fingerprint;
///
/// let a = fingerprint("P365 recall", "https://a.example/p365");
/// assert_eq!(a, fingerprint("P365 recall", "https://a.example/p365"));
/// assert_ne!(a, fingerprint("P365 recall", "https://a.example/p365?ref=rss"));
/// assert_eq!(a.len(), 16);
/// ```
pub fn fingerprint(title_raw: &str, source_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title_raw.as_bytes());
    hasher.update(source_url.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Maps a raw candidate to a canonical item
///
/// Title and description have their whitespace collapsed. The publish time
/// comes from the hint: parsed text, the fetcher's timestamp, or the fetch
/// time when the source gave none.
pub fn normalize(raw: RawCandidate) -> Result<CanonicalItem, Rejection> {
    let title_raw = collapse_whitespace(&raw.title);
    if title_raw.is_empty() {
        return Err(Rejection::EmptyTitle);
    }

    let published_at = match raw.published {
        PublishedHint::At(at) => at,
        PublishedHint::Missing => raw.fetched_at,
        PublishedHint::Text(text) => {
            parse_timestamp(&text).ok_or(Rejection::UnparseableDate(text))?
        }
    };

    let source_url = raw.source_url.trim().to_string();
    let fingerprint = fingerprint(&title_raw, &source_url);

    Ok(CanonicalItem {
        source_name: raw.source_name,
        source_url,
        content_raw: collapse_whitespace(&raw.description),
        image_url: raw
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        title_raw,
        published_at,
        fingerprint,
    })
}
