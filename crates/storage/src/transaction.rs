//! Transaction and table traits for atomic storage operations.
//!
//! A [`Transaction`] exposes named [`Table`]s, each an independent flat
//! keyspace of byte keys to byte values. All writes made through any table
//! of a transaction become visible together at [`commit`](Transaction::commit)
//! or not at all.
//!
//! # Transaction Semantics
//!
//! - **Atomicity**: Writes to every table in the transaction commit together
//! - **Read-your-writes**: Reads and cursors see the transaction's pending writes
//! - **Buffering**: Writes are buffered until commit
//! - **Single use**: `commit` and `rollback` consume the handle
//!
//! The caller owns the transaction lifecycle. Code that receives a
//! `&mut dyn Transaction` (a repository, a store) reads and writes through it
//! but never commits or rolls it back.
//!
//! # Example
//!
//! ```
//! use tenantdb_storage::{MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! backend.create_table("primary").await.unwrap();
//! backend.create_table("index").await.unwrap();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! txn.table("index").unwrap().put(b"org/metrics", b"0001".to_vec()).unwrap();
//! txn.table("primary").unwrap().put(b"0001", b"{}".to_vec()).unwrap();
//! txn.commit().await.unwrap();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! let value = txn.table("primary").unwrap().get(b"0001").await.unwrap();
//! assert_eq!(value.as_deref(), Some(b"{}".as_slice()));
//! # });
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    cursor::{Cursor, CursorOptions},
    error::StorageResult,
};

/// Transaction handle for atomic multi-table commits.
///
/// # Concurrency
///
/// Engines implement isolation between concurrent transactions. The
/// in-memory engine uses optimistic concurrency control: if another
/// transaction commits a write to a key this transaction read or wrote,
/// this transaction's commit fails with
/// [`StorageError::Conflict`](crate::StorageError::Conflict).
#[async_trait]
pub trait Transaction: Send {
    /// Opens the named table within this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TableNotFound`](crate::StorageError::TableNotFound)
    /// if the table was never provisioned on the backend.
    fn table(&mut self, name: &str) -> StorageResult<Box<dyn Table + '_>>;

    /// Commits all buffered operations atomically.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Conflict`](crate::StorageError::Conflict) if a concurrently committed
    ///   transaction touched a key this one read or wrote
    /// - Other [`StorageError`](crate::StorageError) variants on engine failures
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards all buffered operations.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// A named keyspace viewed through a transaction.
#[async_trait]
pub trait Table: Send + Sync {
    /// Returns the table name.
    fn name(&self) -> &str;

    /// Gets a value, consulting pending writes first.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if the key doesn't exist or was deleted in this transaction
    /// - `Err(...)` on storage errors
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Buffers a write of `value` at `key`, overwriting any existing value.
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> StorageResult<()>;

    /// Buffers removal of `key`. Deleting an absent key is a no-op.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    /// Opens a cursor positioned at `seek`.
    ///
    /// See the [`cursor`](crate::cursor) module for seek and prefix
    /// semantics. The returned cursor must be released; wrap it in a
    /// [`CursorGuard`](crate::CursorGuard).
    async fn forward_cursor(
        &self,
        seek: &[u8],
        options: CursorOptions,
    ) -> StorageResult<Box<dyn Cursor>>;
}
