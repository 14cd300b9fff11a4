//! Forward cursors over an ordered table scan.
//!
//! A [`Cursor`] is sequential, single-use and must be released exactly once.
//! Wrap it in a [`CursorGuard`] so release happens on every exit path:
//! normal completion, early `return`, or `?` propagation mid-iteration.
//!
//! # Seek Semantics
//!
//! | Direction | First key yielded |
//! |-----------|-------------------|
//! | [`Ascending`](CursorDirection::Ascending) | smallest key `>= seek` |
//! | [`Descending`](CursorDirection::Descending) | largest key that is `<= seek` or starts with `seek` |
//!
//! The descending rule means seeking a prefix in reverse starts at the last
//! key under that prefix, and an empty seek starts at the end of the table.
//! When [`CursorOptions::prefix`] is set, iteration stops at the first key
//! outside the prefix.
//!
//! # Example
//!
//! ```
//! use tenantdb_storage::{CursorDirection, CursorGuard, CursorOptions, MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! backend.create_table("letters").await.unwrap();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! {
//!     let mut table = txn.table("letters").unwrap();
//!     table.put(b"a", b"1".to_vec()).unwrap();
//!     table.put(b"b", b"2".to_vec()).unwrap();
//! }
//!
//! let table = txn.table("letters").unwrap();
//! let options = CursorOptions::new().with_direction(CursorDirection::Descending);
//! let mut cursor = CursorGuard::new(table.forward_cursor(b"", options).await.unwrap());
//!
//! assert_eq!(cursor.next().map(|kv| kv.key), Some("b".into()));
//! assert_eq!(cursor.next().map(|kv| kv.key), Some("a".into()));
//! assert!(cursor.next().is_none());
//! assert!(cursor.err().is_ok());
//! # });
//! ```

use std::ops::{Deref, DerefMut};

use bytes::Bytes;

use crate::error::StorageResult;

/// One entry yielded by a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Bytes,
    pub value: Bytes,
}

impl KeyValue {
    #[must_use]
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Scan direction of a cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorDirection {
    /// Increasing key order.
    #[default]
    Ascending,
    /// Decreasing key order.
    Descending,
}

/// Options accepted by [`Table::forward_cursor`](crate::Table::forward_cursor).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorOptions {
    /// Scan direction.
    pub direction: CursorDirection,
    /// Restricts iteration to keys starting with these bytes.
    pub prefix: Option<Vec<u8>>,
}

impl CursorOptions {
    /// Ascending scan over the whole table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan direction.
    #[must_use]
    pub fn with_direction(mut self, direction: CursorDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Restricts the scan to keys starting with `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Sequential iterator over a table scan.
///
/// Implementations report iteration failures through [`err`](Cursor::err)
/// rather than through [`next`](Cursor::next): `next` returning `None` means
/// "no more entries", and the caller must check `err` to learn whether the
/// scan ended early.
pub trait Cursor: Send {
    /// Advances the cursor, returning the next entry or `None` when exhausted.
    fn next(&mut self) -> Option<KeyValue>;

    /// Takes the terminal iteration error, if the scan ended because of one.
    fn err(&mut self) -> StorageResult<()>;

    /// Releases the resources held by the cursor.
    ///
    /// Must be idempotent; [`CursorGuard`] calls it exactly once on drop.
    fn close(&mut self);
}

/// Scoped owner of a [`Cursor`] that releases it when dropped.
pub struct CursorGuard {
    inner: Box<dyn Cursor>,
}

impl CursorGuard {
    /// Takes ownership of `cursor`; it is closed when the guard drops.
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self { inner: cursor }
    }
}

impl Deref for CursorGuard {
    type Target = dyn Cursor;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for CursorGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl std::fmt::Debug for CursorGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorGuard").finish_non_exhaustive()
    }
}
