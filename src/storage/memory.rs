use crate::crawler::ExtractedRecord;
use crate::storage::traits::{RecordStore, StorageResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Record store that keeps everything in process memory
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<(Url, ExtractedRecord)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<(Url, ExtractedRecord)>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of stored records in insertion order
    pub fn records(&self) -> Vec<(Url, ExtractedRecord)> {
        self.guard().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn store(&self, url: &Url, record: &ExtractedRecord) -> StorageResult<()> {
        self.guard().push((url.clone(), record.clone()));
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.guard().len() as u64)
    }
}
