//! Shared test utilities for storage engine testing.
//!
//! This module provides common helpers for creating test backends, generating
//! test keys, and asserting on [`StorageResult`] values. It is feature-gated
//! behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tenantdb-storage = { path = "../storage", features = ["testutil"] }
//! ```

use crate::{
    StorageBackend,
    cursor::{CursorGuard, CursorOptions, KeyValue},
    error::{StorageError, StorageResult},
    memory::MemoryBackend,
};

/// Create a deterministic test key from a prefix and index.
///
/// Produces keys like `"prefix:000042"` (zero-padded to 6 digits) encoded
/// as UTF-8 bytes, so lexicographic ordering matches numeric ordering.
#[must_use]
pub fn make_key(prefix: &str, idx: usize) -> Vec<u8> {
    format!("{prefix}:{idx:06}").into_bytes()
}

/// Create a [`MemoryBackend`] with `table` provisioned and holding `count`
/// keys produced by [`make_key`], each mapped to its own key bytes.
///
/// # Panics
///
/// Panics if any engine operation fails (should not happen with `MemoryBackend`).
pub async fn populated_backend(table: &str, prefix: &str, count: usize) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.create_table(table).await.expect("create table failed");

    let mut txn = backend.transaction().await.expect("begin failed");
    {
        let mut t = txn.table(table).expect("open table failed");
        for i in 0..count {
            let key = make_key(prefix, i);
            t.put(&key, key.clone()).expect("populate put failed");
        }
    }
    txn.commit().await.expect("populate commit failed");
    backend
}

/// Drain a full scan of `table` in a fresh transaction.
///
/// # Panics
///
/// Panics if any engine operation fails.
pub async fn scan_all(
    backend: &MemoryBackend,
    table: &str,
    seek: &[u8],
    options: CursorOptions,
) -> Vec<KeyValue> {
    let mut txn = backend.transaction().await.expect("begin failed");
    let t = txn.table(table).expect("open table failed");
    let mut cursor = CursorGuard::new(t.forward_cursor(seek, options).await.expect("cursor failed"));
    let mut entries = Vec::new();
    while let Some(kv) = cursor.next() {
        entries.push(kv);
    }
    cursor.err().expect("cursor ended with an error");
    entries
}

/// Assert that a [`StorageResult`] is a [`StorageError::Conflict`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use tenantdb_storage::assert_conflict;
/// use tenantdb_storage::error::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::Conflict);
/// assert_conflict!(result);
/// ```
#[macro_export]
macro_rules! assert_conflict {
    ($result:expr) => {{
        let result = $result;
        assert!(
            matches!(result, Err($crate::error::StorageError::Conflict)),
            "expected StorageError::Conflict, got: {:?}",
            result,
        );
    }};
    ($result:expr, $msg:expr) => {{
        let result = $result;
        assert!(
            matches!(result, Err($crate::error::StorageError::Conflict)),
            "{}: expected StorageError::Conflict, got: {:?}",
            $msg,
            result,
        );
    }};
}

/// Assert that a [`StorageResult`] is `Ok`, returning the inner value.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Helper to verify that a result is a `Conflict` error.
pub fn is_conflict<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(StorageError::Conflict))
}
