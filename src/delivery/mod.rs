//! Delivery of the selected batch
//!
//! Each item is posted to the ingestion endpoint. When that fails the item
//! is written to the fallback [`PendingStore`] instead; if that fails too the
//! item is dropped. Every item ends with exactly one [`DeliveryOutcome`].

mod ingest;
mod store;

pub use ingest::{IngestClient, IngestResponse};
pub use store::{
    initialize_schema, is_plain_identifier, open_store, schema_sql, PendingRow, PendingStore,
    RestPendingStore, SqlitePendingStore,
};

use crate::config::DeliveryConfig;
use crate::pipeline::CanonicalItem;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Final state of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the ingestion endpoint
    Delivered,
    /// Written to the fallback store
    FallbackDelivered,
    /// Lost; carries the reason
    Dropped(String),
}

impl DeliveryOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }
}

/// Per-outcome counts for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTally {
    pub delivered: usize,
    pub fallback_delivered: usize,
    pub dropped: usize,
}

impl DeliveryTally {
    pub fn from_outcomes(outcomes: &[DeliveryOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut tally, outcome| {
            match outcome {
                DeliveryOutcome::Delivered => tally.delivered += 1,
                DeliveryOutcome::FallbackDelivered => tally.fallback_delivered += 1,
                DeliveryOutcome::Dropped(_) => tally.dropped += 1,
            }
            tally
        })
    }
}

/// Sends items to the endpoint with fallback
pub struct Deliverer {
    ingest: IngestClient,
    fallback: Option<Arc<dyn PendingStore>>,
    item_delay: Duration,
}

impl Deliverer {
    /// # Arguments
    ///
    /// * `ingest` - Endpoint client
    /// * `fallback` - Store used when the endpoint fails; `None` drops instead
    /// * `item_delay` - Pause between two items
    pub fn new(
        ingest: IngestClient,
        fallback: Option<Arc<dyn PendingStore>>,
        item_delay: Duration,
    ) -> Self {
        Self {
            ingest,
            fallback,
            item_delay,
        }
    }

    /// Builds a deliverer from the `[delivery]` settings
    pub fn from_config(
        config: &DeliveryConfig,
        client: reqwest::Client,
        fallback: Option<Arc<dyn PendingStore>>,
    ) -> Self {
        Self::new(
            IngestClient::new(client, config.ingest_url.clone()),
            fallback,
            Duration::from_millis(config.item_delay_ms),
        )
    }

    /// Delivers one item
    ///
    /// `fetched_at` is recorded on the fallback row.
    pub async fn deliver(&self, item: &CanonicalItem, fetched_at: DateTime<Utc>) -> DeliveryOutcome {
        let failure = match self.ingest.submit(item).await {
            Ok(response) => {
                info!(
                    source = %item.source_name,
                    hash = %item.fingerprint,
                    title = %item.title_raw,
                    "Delivered"
                );
                if response.status.is_some() || response.inserted.is_some() {
                    debug!(
                        status = ?response.status,
                        inserted = ?response.inserted,
                        "Ingestion response"
                    );
                }
                return DeliveryOutcome::Delivered;
            }
            Err(e) => e,
        };

        warn!(
            source = %item.source_name,
            hash = %item.fingerprint,
            error = %failure,
            "Ingestion failed"
        );

        let Some(store) = &self.fallback else {
            let reason = format!("ingestion failed and no fallback is configured: {}", failure);
            error!(source = %item.source_name, hash = %item.fingerprint, "{}", reason);
            return DeliveryOutcome::Dropped(reason);
        };

        let row = PendingRow::new(item.clone(), fetched_at);
        match store.insert(&row).await {
            Ok(()) => {
                info!(
                    source = %item.source_name,
                    hash = %item.fingerprint,
                    store = store.name(),
                    "Stored in fallback"
                );
                DeliveryOutcome::FallbackDelivered
            }
            Err(e) => {
                let reason = format!("ingestion failed ({}); fallback failed ({})", failure, e);
                error!(source = %item.source_name, hash = %item.fingerprint, "{}", reason);
                DeliveryOutcome::Dropped(reason)
            }
        }
    }

    /// Delivers a batch in order, pausing between items
    pub async fn deliver_all(
        &self,
        batch: &[CanonicalItem],
        fetched_at: DateTime<Utc>,
    ) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for (i, item) in batch.iter().enumerate() {
            if i > 0 && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
            outcomes.push(self.deliver(item, fetched_at).await);
        }
        outcomes
    }
}
