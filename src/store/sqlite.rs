//! SQLite setting store

use super::{SettingRecord, SettingStore};
use crate::error::Result;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS setting (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    value TEXT,
    updated_at TEXT
);
"#;

/// Setting store backed by a `setting` table in SQLite
///
/// Each upsert runs in its own transaction; an error drops the transaction,
/// which rolls it back.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the table exists
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sqlite`](crate::Error::Sqlite) if the database can't be
    /// opened or the schema can't be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// Private in-memory database
    ///
    /// # Errors
    ///
    /// Same as [`SqliteStore::open`].
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection (e.g. one shared with the rest of the app)
    ///
    /// # Errors
    ///
    /// Returns an error if the `setting` table can't be created.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SettingRecord> {
        let updated_at: Option<String> = row.get(2)?;
        Ok(SettingRecord {
            name: row.get(0)?,
            value: row.get(1)?,
            updated_at: updated_at.and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok()),
        })
    }
}

impl SettingStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn find(&self, name: &str) -> Result<Option<SettingRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT name, value, updated_at FROM setting WHERE name = ?1",
                params![name],
                Self::record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn all(&self) -> Result<Vec<SettingRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value, updated_at FROM setting ORDER BY name")?;
        let records = stmt
            .query_map([], Self::record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn upsert(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| crate::Error::Storage(e.to_string()))?;

        let tx = self.conn.transaction()?;
        let existed: bool = tx
            .query_row(
                "SELECT 1 FROM setting WHERE name = ?1",
                params![name],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !existed {
            debug!("Setting {name} does not exist in the database, adding a new record");
        }

        tx.execute(
            "INSERT INTO setting (name, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![name, value, now],
        )?;
        tx.commit()?;
        Ok(())
    }
}
