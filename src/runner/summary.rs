//! Run summary reporting

use crate::config::SourceKind;
use crate::delivery::DeliveryTally;
use crate::pipeline::SelectionStats;

/// Outcome of one source within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub kind: SourceKind,
    /// Candidates returned by the fetcher
    pub fetched: usize,
    /// Items surviving normalization and the freshness filter
    pub kept: usize,
    /// Set when the source failed as a whole
    pub error: Option<String>,
}

impl SourceReport {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Counts for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    pub candidates: usize,
    pub kept: usize,
    pub stale: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub over_quota: usize,
    pub over_cap: usize,
    pub selected: usize,
    pub delivered: usize,
    pub fallback_delivered: usize,
    pub dropped: usize,
    /// True when the batch was built but not sent
    pub delivery_skipped: bool,
}

impl RunSummary {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.is_failure()).count()
    }

    pub fn record_source(&mut self, report: SourceReport, stale: usize, invalid: usize) {
        self.candidates += report.fetched;
        self.kept += report.kept;
        self.stale += stale;
        self.invalid += invalid;
        self.sources.push(report);
    }

    pub fn record_selection(&mut self, stats: &SelectionStats) {
        self.duplicates = stats.duplicates;
        self.over_quota = stats.over_quota;
        self.over_cap = stats.over_cap;
        self.selected = stats.selected;
    }

    pub fn record_delivery(&mut self, tally: &DeliveryTally) {
        self.delivered = tally.delivered;
        self.fallback_delivered = tally.fallback_delivered;
        self.dropped = tally.dropped;
    }
}

/// Prints a summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Sources ({}, {} failed):", summary.sources.len(), summary.failed_sources());
    for source in &summary.sources {
        match &source.error {
            Some(error) => println!("  {} [{}]: FAILED - {}", source.name, source.kind, error),
            None => println!(
                "  {} [{}]: {} fetched, {} kept",
                source.name, source.kind, source.fetched, source.kept
            ),
        }
    }
    println!();

    println!("Pipeline:");
    println!("  Candidates: {}", summary.candidates);
    println!("  Invalid: {}", summary.invalid);
    println!("  Stale: {}", summary.stale);
    println!("  Kept: {}", summary.kept);
    println!("  Duplicates: {}", summary.duplicates);
    println!("  Over per-source quota: {}", summary.over_quota);
    println!("  Over global cap: {}", summary.over_cap);
    println!("  Selected: {}", summary.selected);
    println!();

    if summary.delivery_skipped {
        println!("Delivery: skipped");
        return;
    }

    println!("Delivery:");
    println!("  Delivered: {}", summary.delivered);
    println!("  Fallback: {}", summary.fallback_delivered);
    println!("  Dropped: {}", summary.dropped);
}
