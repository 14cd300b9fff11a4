//! In-memory storage engine implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered tables**: Each table is a [`BTreeMap`] for efficient cursor scans
//! - **Atomic commits**: Writes to every table of a transaction apply under one write lock
//! - **Optimistic concurrency**: First committer wins on any key both transactions touched
//!
//! # Example
//!
//! ```
//! use tenantdb_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!     backend.create_table("greetings").await.unwrap();
//!
//!     let mut txn = backend.transaction().await.unwrap();
//!     txn.table("greetings").unwrap().put(b"en", b"hello".to_vec()).unwrap();
//!     txn.commit().await.unwrap();
//!
//!     let mut txn = backend.transaction().await.unwrap();
//!     let value = txn.table("greetings").unwrap().get(b"en").await.unwrap();
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Isolation
//!
//! Every committed write stamps its key with a monotonically increasing
//! version. A transaction remembers the version current when it began and
//! every key it read with [`get`](Table::get) or wrote. At commit, if any of
//! those keys carries a newer version, the commit fails with
//! [`StorageError::Conflict`] and nothing is applied.
//!
//! Cursor scans are not part of the conflict set, so phantom inserts into a
//! scanned range are not detected.
//!
//! Versions are never pruned. A deleted key keeps its version entry so the
//! delete still conflicts with transactions that read the key before it, and
//! no entry is dropped once every open transaction has started past it. The
//! version map therefore grows with the number of distinct keys ever
//! written, which suits tests and development but not long-lived workloads.
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | put / delete | O(log p) where p is pending writes |
//! | forward_cursor | O(log n + k) where k is the scanned range, materialized up front |
//! | commit | O(t + w log n) for t touched keys and w writes |

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use fail::fail_point;
use parking_lot::{Mutex, RwLock};

use crate::{
    backend::StorageBackend,
    cursor::{Cursor, CursorDirection, CursorOptions, KeyValue},
    error::{StorageError, StorageResult},
    transaction::{Table, Transaction},
};

/// Committed engine state, guarded by a single lock.
#[derive(Default)]
struct State {
    tables: HashMap<String, BTreeMap<Vec<u8>, Bytes>>,
    /// Commit version of the last write to each key, per table. Entries
    /// survive deletes so a delete still conflicts with concurrent readers.
    versions: HashMap<String, HashMap<Vec<u8>, u64>>,
    clock: u64,
}

/// In-memory transactional engine.
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying tables.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Creates a new, empty engine with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cursors handed out and not yet closed.
    ///
    /// Tests use this to prove every scan releases its cursor.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Returns the committed contents of a table in key order, or `None` if
    /// the table does not exist.
    #[must_use]
    pub fn dump_table(&self, name: &str) -> Option<Vec<KeyValue>> {
        let state = self.state.read();
        state.tables.get(name).map(|table| {
            table
                .iter()
                .map(|(k, v)| KeyValue::new(Bytes::copy_from_slice(k), v.clone()))
                .collect()
        })
    }

    fn has_table(&self, name: &str) -> bool {
        self.state.read().tables.contains_key(name)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryBackend")
            .field("tables", &state.tables.len())
            .field("clock", &state.clock)
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[tracing::instrument(skip(self))]
    async fn create_table(&self, name: &str) -> StorageResult<()> {
        let mut state = self.state.write();
        state.tables.entry(name.to_owned()).or_default();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        let start_version = self.state.read().clock;
        Ok(Box::new(MemoryTransaction::new(self.clone(), start_version)))
    }
}

/// Pending writes of one table: `None` marks a delete.
type PendingTable = BTreeMap<Vec<u8>, Option<Bytes>>;

/// In-memory transaction implementation.
///
/// Buffers writes and deletes per table until commit, providing
/// read-your-writes semantics within the transaction.
struct MemoryTransaction {
    backend: MemoryBackend,
    start_version: u64,
    pending: BTreeMap<String, PendingTable>,
    /// Keys read or written, checked against committed versions at commit.
    touched: Mutex<BTreeMap<String, BTreeSet<Vec<u8>>>>,
}

impl MemoryTransaction {
    fn new(backend: MemoryBackend, start_version: u64) -> Self {
        Self {
            backend,
            start_version,
            pending: BTreeMap::new(),
            touched: Mutex::new(BTreeMap::new()),
        }
    }

    fn touch(&self, table: &str, key: &[u8]) {
        self.touched.lock().entry(table.to_owned()).or_default().insert(key.to_vec());
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn table(&mut self, name: &str) -> StorageResult<Box<dyn Table + '_>> {
        if !self.backend.has_table(name) {
            return Err(StorageError::table_not_found(name));
        }
        Ok(Box::new(MemoryTable { txn: self, name: name.to_owned() }))
    }

    #[tracing::instrument(skip(self))]
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        fail_point!("memory-commit", |_| {
            Err(StorageError::internal("injected failure before commit"))
        });

        let Self { backend, start_version, pending, touched } = *self;
        let touched = touched.into_inner();

        let mut guard = backend.state.write();
        let state = &mut *guard;

        // Verify nothing we touched was committed by someone else since we began
        for (table, keys) in &touched {
            let Some(versions) = state.versions.get(table) else {
                continue;
            };
            if keys.iter().any(|key| versions.get(key).is_some_and(|v| *v > start_version)) {
                tracing::debug!(table = %table, "commit rejected by concurrent write");
                return Err(StorageError::Conflict);
            }
        }

        for table in pending.keys() {
            if !state.tables.contains_key(table) {
                return Err(StorageError::table_not_found(table.clone()));
            }
        }

        state.clock += 1;
        let version = state.clock;

        for (table, writes) in pending {
            let versions = state.versions.entry(table.clone()).or_default();
            let Some(entries) = state.tables.get_mut(&table) else {
                continue;
            };
            for (key, value) in writes {
                match value {
                    Some(v) => {
                        entries.insert(key.clone(), v);
                    },
                    None => {
                        entries.remove(&key);
                    },
                }
                versions.insert(key, version);
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        tracing::debug!(pending_tables = self.pending.len(), "discarding transaction");
        Ok(())
    }
}

/// A table viewed through a [`MemoryTransaction`].
struct MemoryTable<'a> {
    txn: &'a mut MemoryTransaction,
    name: String,
}

impl MemoryTable<'_> {
    fn pending_mut(&mut self) -> &mut PendingTable {
        self.txn.pending.entry(self.name.clone()).or_default()
    }
}

#[async_trait]
impl Table for MemoryTable<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        fail_point!("memory-table-get", |_| {
            Err(StorageError::internal("injected failure in table get"))
        });

        self.txn.touch(&self.name, key);

        // Check pending writes first (read-your-writes)
        if let Some(value) = self.txn.pending.get(&self.name).and_then(|t| t.get(key)) {
            return Ok(value.clone());
        }

        let state = self.txn.backend.state.read();
        let table = state.tables.get(&self.name).ok_or_else(|| {
            StorageError::table_not_found(self.name.clone())
        })?;
        Ok(table.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()> {
        fail_point!("memory-table-put", |_| {
            Err(StorageError::internal("injected failure in table put"))
        });

        self.pending_mut().insert(key.to_vec(), Some(Bytes::from(value)));
        self.txn.touch(&self.name, key);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        fail_point!("memory-table-delete", |_| {
            Err(StorageError::internal("injected failure in table delete"))
        });

        self.pending_mut().insert(key.to_vec(), None);
        self.txn.touch(&self.name, key);
        Ok(())
    }

    async fn forward_cursor(
        &self,
        seek: &[u8],
        options: CursorOptions,
    ) -> StorageResult<Box<dyn Cursor>> {
        let upper_end = prefix_end(seek);
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = match options.direction {
            CursorDirection::Ascending => (Bound::Included(seek), Bound::Unbounded),
            CursorDirection::Descending => (
                Bound::Unbounded,
                upper_end.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
            ),
        };

        // Merge committed entries with this transaction's pending writes
        let mut merged: BTreeMap<Vec<u8>, Bytes> = {
            let state = self.txn.backend.state.read();
            let table = state
                .tables
                .get(&self.name)
                .ok_or_else(|| StorageError::table_not_found(self.name.clone()))?;
            table.range::<[u8], _>(bounds).map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        if let Some(pending) = self.txn.pending.get(&self.name) {
            for (key, value) in pending.range::<[u8], _>(bounds) {
                match value {
                    Some(v) => {
                        merged.insert(key.clone(), v.clone());
                    },
                    None => {
                        merged.remove(key);
                    },
                }
            }
        }

        let ordered: Box<dyn Iterator<Item = (Vec<u8>, Bytes)>> = match options.direction {
            CursorDirection::Ascending => Box::new(merged.into_iter()),
            CursorDirection::Descending => Box::new(merged.into_iter().rev()),
        };
        let entries: Vec<KeyValue> = ordered
            .take_while(|(key, _)| options.prefix.as_ref().is_none_or(|p| key.starts_with(p)))
            .map(|(k, v)| KeyValue::new(Bytes::from(k), v))
            .collect();

        self.txn.backend.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            entries: entries.into_iter(),
            error: None,
            closed: false,
            open_cursors: Arc::clone(&self.txn.backend.open_cursors),
        }))
    }
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when no such key exists (empty prefix, or all `0xFF` bytes).
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Cursor over a scan materialized when the cursor was opened.
struct MemoryCursor {
    entries: std::vec::IntoIter<KeyValue>,
    error: Option<StorageError>,
    closed: bool,
    open_cursors: Arc<AtomicUsize>,
}

impl Cursor for MemoryCursor {
    fn next(&mut self) -> Option<KeyValue> {
        if self.closed || self.error.is_some() {
            return None;
        }

        fail_point!("memory-cursor-next", |_| {
            self.error = Some(StorageError::internal("injected failure in cursor next"));
            None
        });

        self.entries.next()
    }

    fn err(&mut self) -> StorageResult<()> {
        self.error.take().map_or(Ok(()), Err)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
