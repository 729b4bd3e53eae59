//! Storage layer for mailtriage
//!
//! Provides message fingerprints and the append-only record store used for
//! duplicate detection and auditing.
//!
//! A store hands out one `StoreSession` per phase-2 task. The session owns its
//! connection for the duration of the task, and is committed then dropped; a
//! session dropped without commit rolls back.
//!
//! Duplicate detection is `exists` followed by `insert`. The orchestrator treats
//! that pair as best-effort: two tasks with the same fingerprint in one batch may
//! both observe "not a duplicate" unless the store makes the pair atomic.
//! `SqliteRecordStore` does (write transactions are taken up front);
//! `MemoryRecordStore` does not.

pub mod database;
pub mod fingerprint;
pub mod memory;

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub use database::SqliteRecordStore;
pub use fingerprint::fingerprint;
pub use memory::MemoryRecordStore;

/// Persisted row for one processed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub filename: String,
    pub sender: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub confidence: f32,
    /// JSON-serialized context
    pub context: String,
    pub fingerprint: String,
}

/// Keyed record store collaborator
pub trait RecordStore: Send + Sync {
    /// Create tables and indexes if they do not exist
    fn ensure_schema(&self) -> Result<()>;

    /// Open a task-scoped session with its own connection
    fn open_session(&self) -> Result<Box<dyn StoreSession + '_>>;

    /// Total number of stored records
    fn count(&self) -> Result<usize>;

    /// Number of stored records carrying `fingerprint`
    fn count_fingerprint(&self, fingerprint: &str) -> Result<usize>;
}

/// Unit of work against the record store for a single message
pub trait StoreSession {
    fn exists(&mut self, fingerprint: &str) -> Result<bool>;

    fn insert(&mut self, record: &StoredRecord) -> Result<()>;

    /// Make the session's inserts durable and release the connection
    fn commit(self: Box<Self>) -> Result<()>;
}
