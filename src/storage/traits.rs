//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and the
//! associated error type.

use crate::crawler::ExtractedRecord;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only sink for extracted records
///
/// Implementations never update or deduplicate: storing the same page twice
/// produces two rows.
pub trait RecordStore: Send + Sync {
    /// Appends one record taken from `url`
    fn store(&self, url: &Url, record: &ExtractedRecord) -> StorageResult<()>;

    /// Number of records stored so far
    fn count(&self) -> StorageResult<u64>;
}
