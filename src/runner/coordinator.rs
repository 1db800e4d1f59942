//! Run orchestration
//!
//! The runner walks the source registry sequentially, isolates failures to
//! the source that caused them, and hands the merged result to selection and
//! delivery.

use crate::config::SourceRegistry;
use crate::delivery::{Deliverer, DeliveryTally};
use crate::fetch::FetcherSet;
use crate::pipeline::{prepare, FreshnessFilter, SelectionBatch, SelectionPolicy};
use crate::runner::summary::{RunSummary, SourceReport};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Sequential crawl-select-deliver pass
pub struct Runner {
    registry: SourceRegistry,
    fetchers: FetcherSet,
    freshness: FreshnessFilter,
    policy: SelectionPolicy,
    deliverer: Option<Deliverer>,
    source_delay: Duration,
}

impl Runner {
    /// Creates a runner that selects but does not deliver
    ///
    /// # Arguments
    ///
    /// * `registry` - Sources in processing order
    /// * `fetchers` - Fetcher for each source kind
    /// * `freshness` - Lookback window
    /// * `policy` - Quota and cap
    pub fn new(
        registry: SourceRegistry,
        fetchers: FetcherSet,
        freshness: FreshnessFilter,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            registry,
            fetchers,
            freshness,
            policy,
            deliverer: None,
            source_delay: Duration::ZERO,
        }
    }

    pub fn with_deliverer(mut self, deliverer: Deliverer) -> Self {
        self.deliverer = Some(deliverer);
        self
    }

    /// Pause between two sources
    pub fn with_source_delay(mut self, delay: Duration) -> Self {
        self.source_delay = delay;
        self
    }

    /// Runs one full pass: fetch every source, select, deliver
    ///
    /// Source and item failures are logged and counted, never returned.
    pub async fn run(&self) -> RunSummary {
        let started = Utc::now();
        let (batch, mut summary) = self.collect(started).await;

        match &self.deliverer {
            Some(deliverer) => {
                tracing::info!("Delivering {} items", batch.len());
                let outcomes = deliverer.deliver_all(&batch, started).await;
                summary.record_delivery(&DeliveryTally::from_outcomes(&outcomes));
            }
            None => {
                tracing::info!("No deliverer configured, skipping delivery");
                summary.delivery_skipped = true;
            }
        }

        tracing::info!(
            sources = summary.sources.len(),
            failed_sources = summary.failed_sources(),
            selected = summary.selected,
            delivered = summary.delivered,
            fallback = summary.fallback_delivered,
            dropped = summary.dropped,
            "Run complete"
        );

        summary
    }

    /// Fetches every source and builds the selection batch
    ///
    /// # Arguments
    ///
    /// * `now` - Reference time for the freshness window
    ///
    /// # Returns
    ///
    /// The batch in delivery order and a summary without delivery counts
    pub async fn collect(&self, now: DateTime<Utc>) -> (SelectionBatch, RunSummary) {
        let cutoff = self.freshness.cutoff(now);
        let mut summary = RunSummary::default();
        let mut collected = Vec::new();

        tracing::info!(
            "Starting run over {} sources (cutoff {})",
            self.registry.len(),
            cutoff.to_rfc3339()
        );

        for (index, source) in self.registry.iter().enumerate() {
            if index > 0 && !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }

            tracing::info!(source = %source.name, kind = %source.kind, url = %source.url, "Fetching source");

            let fetcher = self.fetchers.for_kind(source.kind);
            match fetcher.fetch(source, cutoff).await {
                Ok(candidates) => {
                    let fetched = candidates.len();
                    let prepared = prepare(candidates, &self.freshness, cutoff);
                    let kept = prepared.items.len();

                    tracing::info!(
                        source = %source.name,
                        fetched,
                        kept,
                        stale = prepared.stale,
                        invalid = prepared.invalid,
                        "Source done"
                    );

                    summary.record_source(
                        SourceReport {
                            name: source.name.clone(),
                            kind: source.kind,
                            fetched,
                            kept,
                            error: None,
                        },
                        prepared.stale,
                        prepared.invalid,
                    );
                    collected.extend(prepared.items);
                }
                Err(e) => {
                    tracing::error!(source = %source.name, error = %e, "Source failed");
                    summary.record_source(
                        SourceReport {
                            name: source.name.clone(),
                            kind: source.kind,
                            fetched: 0,
                            kept: 0,
                            error: Some(e.to_string()),
                        },
                        0,
                        0,
                    );
                }
            }
        }

        let (batch, stats) = self.policy.select(collected, &self.registry.names());
        summary.record_selection(&stats);

        tracing::info!(
            selected = stats.selected,
            duplicates = stats.duplicates,
            over_quota = stats.over_quota,
            over_cap = stats.over_cap,
            "Selection complete"
        );

        (batch, summary)
    }
}
