//! SQLite pending store
//!
//! Keeps fallback rows in a local database file. The connection sits behind
//! a mutex that is only taken for the duration of a statement.

use super::schema::{initialize_schema, is_plain_identifier};
use super::{PendingRow, PendingStore};
use crate::config::DEFAULT_PENDING_TABLE;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Local SQLite backend
pub struct SqlitePendingStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqlitePendingStore {
    /// Opens (or creates) the database at `path` using the default table
    pub fn new(path: &Path) -> StoreResult<Self> {
        Self::with_table(path, DEFAULT_PENDING_TABLE)
    }

    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Table receiving rows; must be a plain identifier
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePendingStore)` - Database opened and schema in place
    /// * `Err(StoreError)` - Bad table name or failed to open database
    pub fn with_table(path: &Path, table: &str) -> StoreResult<Self> {
        check_table(table)?;
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn, table)?;

        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, DEFAULT_PENDING_TABLE)?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: DEFAULT_PENDING_TABLE.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Inserts a row unless its hash is already stored
    ///
    /// # Returns
    ///
    /// `true` when a row was written
    pub fn insert_row(&self, row: &PendingRow) -> StoreResult<bool> {
        let conn = self.lock()?;
        let sql = format!(
            "INSERT OR IGNORE INTO {}
                (source_name, source_url, title_raw, content_raw, image_url,
                 published_at, hash, fetched_at, processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            self.table
        );
        let changed = conn.execute(
            &sql,
            params![
                row.item.source_name,
                row.item.source_url,
                row.item.title_raw,
                row.item.content_raw,
                row.item.image_url,
                row.item.published_at.to_rfc3339(),
                row.item.fingerprint,
                row.fetched_at.to_rfc3339(),
                row.processed,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Number of rows not yet processed
    pub fn count_pending(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE processed = 0", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Hashes of all stored rows, oldest first
    pub fn hashes(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT hash FROM {} ORDER BY id", self.table))?;
        let hashes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(hashes)
    }
}

fn check_table(table: &str) -> StoreResult<()> {
    if is_plain_identifier(table) {
        Ok(())
    } else {
        Err(StoreError::Config(format!(
            "table must be a plain identifier, got '{}'",
            table
        )))
    }
}

#[async_trait]
impl PendingStore for SqlitePendingStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, row: &PendingRow) -> StoreResult<()> {
        if !self.insert_row(row)? {
            debug!(hash = %row.item.fingerprint, "Pending row already stored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::store::tests::sample_row;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_insert_and_count() {
        let store = SqlitePendingStore::new_in_memory().unwrap();
        store.insert(&sample_row()).await.unwrap();

        assert_eq!(store.count_pending().unwrap(), 1);
        assert_eq!(store.hashes().unwrap(), vec![sample_row().item.fingerprint]);
    }

    #[tokio::test]
    async fn test_reinsert_is_ignored() {
        let store = SqlitePendingStore::new_in_memory().unwrap();
        assert!(store.insert_row(&sample_row()).unwrap());
        assert!(!store.insert_row(&sample_row()).unwrap());
        store.insert(&sample_row()).await.unwrap();

        assert_eq!(store.count_pending().unwrap(), 1);
    }

    #[test]
    fn test_fields_round_trip_to_columns() {
        let store = SqlitePendingStore::new_in_memory().unwrap();
        store.insert_row(&sample_row()).unwrap();

        let conn = store.lock().unwrap();
        let (title, image, published, processed): (String, Option<String>, String, bool) = conn
            .query_row(
                "SELECT title_raw, image_url, published_at, processed FROM pending_news",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(title, "Title");
        assert_eq!(image.as_deref(), Some("https://a.example/i.jpg"));
        assert_eq!(published, "2024-06-09T08:00:00+00:00");
        assert!(!processed);
    }

    #[test]
    fn test_configured_table_receives_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.db");
        let store = SqlitePendingStore::with_table(&path, "queued_items").unwrap();
        assert!(store.insert_row(&sample_row()).unwrap());
        assert_eq!(store.table(), "queued_items");
        assert_eq!(store.count_pending().unwrap(), 1);

        let conn = store.lock().unwrap();
        let default_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='pending_news'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(default_tables, 0);
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let dir = TempDir::new().unwrap();
        let result = SqlitePendingStore::with_table(&dir.path().join("p.db"), "x; DROP TABLE y");
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pending.db");

        {
            let store = SqlitePendingStore::new(&path).unwrap();
            store.insert_row(&sample_row()).unwrap();
        }

        let reopened = SqlitePendingStore::new(&path).unwrap();
        assert_eq!(reopened.count_pending().unwrap(), 1);
    }
}
