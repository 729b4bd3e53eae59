//! Process-local record store
//!
//! Used for `--ephemeral` runs and tests. Sessions stage inserts and publish them
//! on commit; `exists` only sees committed records, so concurrent sessions with
//! the same fingerprint can both miss each other.

use super::{RecordStore, StoreSession, StoredRecord};
use crate::error::{Result, TriageError};
use ahash::AHashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    records: Vec<StoredRecord>,
    by_fingerprint: AHashMap<String, usize>,
}

#[derive(Default, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every committed record, in commit order
    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        Ok(self.lock()?.records.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| TriageError::Store("Memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn open_session(&self) -> Result<Box<dyn StoreSession + '_>> {
        Ok(Box::new(MemorySession {
            store: self,
            staged: Vec::new(),
        }))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.records.len())
    }

    fn count_fingerprint(&self, fingerprint: &str) -> Result<usize> {
        Ok(self
            .lock()?
            .by_fingerprint
            .get(fingerprint)
            .copied()
            .unwrap_or(0))
    }
}

struct MemorySession<'a> {
    store: &'a MemoryRecordStore,
    staged: Vec<StoredRecord>,
}

impl StoreSession for MemorySession<'_> {
    fn exists(&mut self, fingerprint: &str) -> Result<bool> {
        Ok(self.store.lock()?.by_fingerprint.contains_key(fingerprint))
    }

    fn insert(&mut self, record: &StoredRecord) -> Result<()> {
        self.staged.push(record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemorySession { store, staged } = *self;
        let mut inner = store.lock()?;
        for record in staged {
            *inner
                .by_fingerprint
                .entry(record.fingerprint.clone())
                .or_insert(0) += 1;
            inner.records.push(record);
        }
        Ok(())
    }
}
