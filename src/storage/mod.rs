//! Storage module for persisting extracted records
//!
//! This module handles:
//! - The append-only `RecordStore` capability
//! - SQLite database initialization and schema management
//! - An in-memory store for crawls without a database

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::config::OutputConfig;
use std::path::Path;
use std::sync::Arc;

/// Opens the record store described by the output config
///
/// # Returns
///
/// * `Ok(store)` - SQLite when `database-path` is set, memory otherwise
/// * `Err(StorageError)` - Failed to open the database
pub fn open_store(config: &OutputConfig) -> StorageResult<Arc<dyn RecordStore>> {
    match &config.database_path {
        Some(path) => {
            tracing::info!("Storing records in {}", path);
            Ok(Arc::new(SqliteRecordStore::new(Path::new(path))?))
        }
        None => {
            tracing::info!("No database configured; records are kept in memory");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}
