//! Fallback stores for items the ingestion endpoint rejected
//!
//! A [`PendingStore`] receives the row the endpoint would have written, so a
//! later job can pick it up. Two backends exist: a PostgREST-style REST
//! insert into the managed backend, and a local SQLite file.

mod rest;
mod schema;
mod sqlite;

pub use rest::RestPendingStore;
pub use schema::{initialize_schema, is_plain_identifier, schema_sql};
pub use sqlite::SqlitePendingStore;

use crate::config::{FallbackBackend, FallbackConfig};
use crate::pipeline::CanonicalItem;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Row written by a fallback insert: the submitted fields plus bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRow {
    #[serde(flatten)]
    pub item: CanonicalItem,
    pub fetched_at: DateTime<Utc>,
    /// Always false on insert; the consumer flips it
    pub processed: bool,
}

impl PendingRow {
    pub fn new(item: CanonicalItem, fetched_at: DateTime<Utc>) -> Self {
        Self {
            item,
            fetched_at,
            processed: false,
        }
    }
}

/// Destination for items that could not be delivered to the endpoint
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// Backend label used in logs
    fn name(&self) -> &str;

    /// Inserts one row
    async fn insert(&self, row: &PendingRow) -> StoreResult<()>;
}

/// Opens the store described by the `[fallback]` config
///
/// # Arguments
///
/// * `config` - Fallback settings (already validated)
/// * `client` - HTTP client used by the REST backend
/// * `base_dir` - Directory against which a relative `database-path` is
///   resolved; the config file's directory, as for `sources-file`
pub fn open_store(
    config: &FallbackConfig,
    client: Client,
    base_dir: &Path,
) -> StoreResult<Arc<dyn PendingStore>> {
    match config.backend {
        FallbackBackend::Rest => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Config("rest fallback needs a url".to_string()))?;
            let key = config.service_key.as_deref().ok_or_else(|| {
                StoreError::Config("rest fallback needs a service key".to_string())
            })?;
            Ok(Arc::new(RestPendingStore::new(client, url, key, &config.table)))
        }
        FallbackBackend::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                StoreError::Config("sqlite fallback needs a database path".to_string())
            })?;
            let path = Path::new(path);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            Ok(Arc::new(SqlitePendingStore::with_table(&path, &config.table)?))
        }
    }
}
