//! SQLite schema for the local pending-news store

/// Table and indexes receiving fallback inserts
///
/// `hash` is unique so that re-inserting an item is a no-op. `table` must
/// pass [`is_plain_identifier`].
pub fn schema_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL,
    source_url TEXT NOT NULL,
    title_raw TEXT NOT NULL,
    content_raw TEXT NOT NULL,
    image_url TEXT,
    published_at TEXT NOT NULL,
    hash TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    processed INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_hash ON {table}(hash);
CREATE INDEX IF NOT EXISTS idx_{table}_processed ON {table}(processed);
"#
    )
}

/// True for names made only of ASCII letters, digits and underscores,
/// not starting with a digit
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Initializes the database schema for `table`
///
/// Safe to call on an existing database.
pub fn initialize_schema(conn: &rusqlite::Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&schema_sql(table))?;
    Ok(())
}
