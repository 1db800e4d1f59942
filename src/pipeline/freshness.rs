//! Freshness window

use crate::pipeline::CanonicalItem;
use chrono::{DateTime, Duration, Utc};

/// Keeps items published within the lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessFilter {
    lookback: Duration,
}

impl FreshnessFilter {
    pub fn new(lookback: Duration) -> Self {
        Self { lookback }
    }

    pub fn from_hours(hours: u64) -> Self {
        let hours = i64::try_from(hours).unwrap_or(i64::MAX / 3_600_000);
        Self::new(Duration::hours(hours))
    }

    /// Oldest publish time still considered fresh at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether an item is fresh; the boundary itself is inclusive
    pub fn is_fresh(&self, item: &CanonicalItem, cutoff: DateTime<Utc>) -> bool {
        item.published_at >= cutoff
    }

    /// Drops stale items, preserving order
    ///
    /// # Returns
    ///
    /// The fresh items and the number dropped
    pub fn apply(&self, items: Vec<CanonicalItem>, cutoff: DateTime<Utc>) -> (Vec<CanonicalItem>, usize) {
        let before = items.len();
        let fresh: Vec<_> = items
            .into_iter()
            .filter(|item| self.is_fresh(item, cutoff))
            .collect();
        let stale = before - fresh.len();
        (fresh, stale)
    }
}
