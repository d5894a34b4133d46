//! Injected persistent state for the registry.
//!
//! The registry owns no native data structures: every logical record (the
//! selector mapping, per-module selector sets, the live-module list, the
//! owner) lives in an external keyed store behind [`StateStore`]. Mutations
//! are staged in a [`Transaction`] overlay and committed as one
//! [`StateStore::apply`] batch, so the all-or-nothing contract of a cut is
//! enforced by the store's transaction boundary rather than by undo logic.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tracing::{debug, trace};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// One mutation in a commit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or overwrite the value under a key.
    Put {
        /// Record key.
        key: String,
        /// Record value.
        value: Vec<u8>,
    },
    /// Remove the record under a key, if present.
    Delete {
        /// Record key.
        key: String,
    },
}

/// Keyed persistent storage with an atomic batch-commit boundary.
///
/// Implementations must make [`apply`](Self::apply) atomic: either every op
/// in the batch lands or none do. The execution environment is globally
/// sequential, so implementations need no cross-invocation locking beyond
/// that boundary.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Apply a batch of writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails; on error no op from the
    /// batch is visible.
    async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Read-through staging overlay over a [`StateStore`].
///
/// Reads consult staged writes first, then the underlying store. Staged
/// writes become visible to other observers only after [`commit`]
/// (one atomic [`StateStore::apply`] batch); dropping the transaction
/// discards them. Facet code receives a `&Transaction` as its shared state
/// handle, so writes made by delegated code obey the same boundary.
///
/// [`commit`]: Transaction::commit
pub struct Transaction {
    store: Arc<dyn StateStore>,
    /// Staged state per key: `Some(value)` for a pending put, `None` for a
    /// pending delete.
    staged: RwLock<HashMap<String, Option<Vec<u8>>>>,
}

impl Transaction {
    /// Open a transaction over `store`. Opening stages nothing; a
    /// transaction that is never written to is a plain read view.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            staged: RwLock::new(HashMap::new()),
        }
    }

    /// Read `key`, seeing staged writes from this transaction first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let staged = {
            let map = self.staged.read().map_err(|_| StoreError::Poisoned)?;
            map.get(key).cloned()
        };
        match staged {
            Some(value) => Ok(value),
            None => self.store.get(key).await,
        }
    }

    /// Stage a put of `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the overlay lock is poisoned.
    pub fn put(&self, key: impl Into<String>, value: Vec<u8>) -> Result<(), StoreError> {
        let mut map = self.staged.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.into(), Some(value));
        Ok(())
    }

    /// Stage a delete of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the overlay lock is poisoned.
    pub fn delete(&self, key: impl Into<String>) -> Result<(), StoreError> {
        let mut map = self.staged.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.into(), None);
        Ok(())
    }

    /// Commit all staged writes as one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the batch; nothing is
    /// committed in that case.
    pub async fn commit(self) -> Result<(), StoreError> {
        let Self { store, staged } = self;
        let staged = staged.into_inner().map_err(|_| StoreError::Poisoned)?;
        if staged.is_empty() {
            return Ok(());
        }
        let batch: Vec<WriteOp> = staged
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => WriteOp::Put { key, value },
                None => WriteOp::Delete { key },
            })
            .collect();
        trace!(ops = batch.len(), "committing staged writes");
        store.apply(batch).await
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let staged = match self.staged.read() {
            Ok(map) => map.len(),
            Err(_) => 0,
        };
        f.debug_struct("Transaction").field("staged", &staged).finish()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and hosts that manage durability themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(key).cloned())
    }

    async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        for op in batch {
            match op {
                WriteOp::Put { key, value } => {
                    records.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// SQLite-backed store; each [`apply`](StateStore::apply) batch runs inside
/// one SQL transaction.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the
    /// key/value schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or the schema
    /// cannot be created.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS registry_kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        debug!(url, "sqlite store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT value FROM registry_kv WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StoreError> {
        let ops = batch.len();
        let mut tx = self.pool.begin().await?;
        for op in batch {
            match op {
                WriteOp::Put { key, value } => {
                    sqlx::query(
                        "INSERT INTO registry_kv (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    )
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { key } => {
                    sqlx::query("DELETE FROM registry_kv WHERE key = ?1")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        trace!(ops, "sqlite batch committed");
        Ok(())
    }
}
