//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::crawler::ExtractedRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// SQLite record store shared by all workers
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens or creates the records database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteRecordStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored records in insertion order, as `(url, record)` pairs
    pub fn records(&self) -> StorageResult<Vec<(String, ExtractedRecord)>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT url, title, sub_title, content FROM records ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    ExtractedRecord {
                        title: row.get(1)?,
                        sub_title: row.get(2)?,
                        content: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl RecordStore for SqliteRecordStore {
    fn store(&self, url: &Url, record: &ExtractedRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO records (url, title, sub_title, content, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                url.as_str(),
                record.title,
                record.sub_title,
                record.content,
                now
            ],
        )?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
