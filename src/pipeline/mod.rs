//! Item pipeline: normalization, freshness and selection
//!
//! Raw candidates from every source are normalized into [`CanonicalItem`]s,
//! filtered to the freshness window, and finally deduplicated and cut down
//! to a balanced [`SelectionBatch`].

mod freshness;
mod normalize;
mod select;
pub(crate) mod text;
mod timestamp;

pub use freshness::FreshnessFilter;
pub use normalize::{fingerprint, normalize, CanonicalItem, Rejection, FINGERPRINT_LEN};
pub use select::{dedup, SelectionBatch, SelectionPolicy, SelectionStats};
pub use timestamp::parse_timestamp;

use crate::fetch::RawCandidate;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Result of normalizing and freshness-filtering one source's candidates
#[derive(Debug, Default)]
pub struct Prepared {
    pub items: Vec<CanonicalItem>,
    /// Candidates rejected by the normalizer
    pub invalid: usize,
    /// Items older than the cutoff
    pub stale: usize,
}

/// Normalizes candidates and drops those outside the freshness window
///
/// Order is preserved.
pub fn prepare(
    candidates: Vec<RawCandidate>,
    filter: &FreshnessFilter,
    cutoff: DateTime<Utc>,
) -> Prepared {
    let mut prepared = Prepared::default();
    let mut normalized = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let url = candidate.source_url.clone();
        match normalize(candidate) {
            Ok(item) => normalized.push(item),
            Err(rejection) => {
                debug!(url = %url, reason = %rejection, "Dropping candidate");
                prepared.invalid += 1;
            }
        }
    }

    let (items, stale) = filter.apply(normalized, cutoff);
    prepared.items = items;
    prepared.stale = stale;
    prepared
}
