//! Deduplication and hybrid selection
//!
//! Selection is positional: nothing is ranked. Duplicates are removed first
//! (first occurrence wins), then each source keeps its first `quota` items,
//! then groups are concatenated in registry order and cut at the global cap.

use crate::config::SelectionConfig;
use crate::pipeline::CanonicalItem;
use std::collections::{HashMap, HashSet};

/// Items chosen for delivery, in delivery order
pub type SelectionBatch = Vec<CanonicalItem>;

/// Counts of items removed at each selection stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub duplicates: usize,
    pub over_quota: usize,
    pub over_cap: usize,
    pub selected: usize,
}

/// Removes items whose fingerprint was already seen, keeping the first
///
/// # Returns
///
/// The unique items in original order and the number removed
pub fn dedup(items: Vec<CanonicalItem>) -> (Vec<CanonicalItem>, usize) {
    let before = items.len();
    let mut seen = HashSet::new();
    let unique: Vec<_> = items
        .into_iter()
        .filter(|item| seen.insert(item.fingerprint.clone()))
        .collect();
    let removed = before - unique.len();
    (unique, removed)
}

/// Per-source quota and global cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub per_source_quota: usize,
    pub global_cap: usize,
}

impl SelectionPolicy {
    pub fn new(per_source_quota: usize, global_cap: usize) -> Self {
        Self {
            per_source_quota,
            global_cap,
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.per_source_quota, config.global_cap)
    }

    /// Builds the delivery batch
    ///
    /// # Arguments
    ///
    /// * `items` - Fresh items in fetch order
    /// * `source_order` - Source names in registry order; sources not listed
    ///   follow in order of first appearance
    pub fn select(
        &self,
        items: Vec<CanonicalItem>,
        source_order: &[&str],
    ) -> (SelectionBatch, SelectionStats) {
        let mut stats = SelectionStats::default();

        let (unique, duplicates) = dedup(items);
        stats.duplicates = duplicates;

        let mut order: Vec<String> = source_order.iter().map(|s| s.to_string()).collect();
        let mut groups: HashMap<String, Vec<CanonicalItem>> = HashMap::new();
        for item in unique {
            if !order.iter().any(|name| *name == item.source_name) {
                order.push(item.source_name.clone());
            }
            let group = groups.entry(item.source_name.clone()).or_default();
            if group.len() < self.per_source_quota {
                group.push(item);
            } else {
                stats.over_quota += 1;
            }
        }

        let mut batch: SelectionBatch = order
            .iter()
            .filter_map(|name| groups.remove(name))
            .flatten()
            .collect();

        if batch.len() > self.global_cap {
            stats.over_cap = batch.len() - self.global_cap;
            batch.truncate(self.global_cap);
        }

        stats.selected = batch.len();
        (batch, stats)
    }
}
