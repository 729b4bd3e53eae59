//! SQLite record store with migrations
//!
//! Every session checks a pooled connection out, opens a write transaction
//! immediately and holds both until commit or drop.

use super::{RecordStore, StoreSession, StoredRecord};
use crate::error::{Result, TriageError};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Record store backed by a pooled SQLite database
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    /// Open (or create) the database file
    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TriageError::Io {
                    source: e,
                    context: format!("Failed to create database directory: {:?}", parent),
                })?;
            }
        }

        // Per-connection settings; journal mode is persisted in the file
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });

        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| TriageError::Store(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool
    fn get_conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| TriageError::Store(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        // Create migrations table if it doesn't exist
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        // Get current version
        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        // Apply migrations
        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn ensure_schema(&self) -> Result<()> {
        self.migrate()
    }

    fn open_session(&self) -> Result<Box<dyn StoreSession + '_>> {
        let conn = self.get_conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| TriageError::Store(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(SqliteSession {
            conn,
            finished: false,
        }))
    }

    fn count(&self) -> Result<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_fingerprint(&self, fingerprint: &str) -> Result<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM emails WHERE fingerprint = ?1",
            params![fingerprint],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Task-scoped transaction on a pooled connection
struct SqliteSession {
    conn: PooledConnection<SqliteConnectionManager>,
    finished: bool,
}

impl StoreSession for SqliteSession {
    fn exists(&mut self, fingerprint: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM emails WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .map_err(|e| TriageError::Store(format!("Duplicate check failed: {}", e)))?;
        Ok(count > 0)
    }

    fn insert(&mut self, record: &StoredRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO emails
                    (filename, sender, category, subcategory, confidence, context, fingerprint, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))",
                params![
                    &record.filename,
                    &record.sender,
                    &record.category,
                    record.subcategory.as_deref(),
                    record.confidence as f64,
                    &record.context,
                    &record.fingerprint,
                ],
            )
            .map_err(|e| TriageError::Store(format!("Insert failed: {}", e)))?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| TriageError::Store(format!("Commit failed: {}", e)))?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Failed to roll back unfinished session: {}", e);
            }
        }
    }
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- One row per processed message, duplicates included
    CREATE TABLE emails (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        sender TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        subcategory TEXT,
        confidence REAL NOT NULL,
        context TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        processed_at TEXT NOT NULL
    );

    CREATE INDEX idx_emails_fingerprint ON emails(fingerprint);
    CREATE INDEX idx_emails_category ON emails(category);
    "#,
];
