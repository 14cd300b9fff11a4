//! Transactional key-value engine contract for tenantdb.
//!
//! This crate provides the [`StorageBackend`], [`Transaction`], [`Table`] and
//! [`Cursor`] traits that repository crates (such as the bucket store in
//! `tenantdb-tenant`) consume, plus [`MemoryBackend`], an in-memory engine
//! used for tests and development.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Repository Layer                          │
//! │        BucketStore (identity, name index, pagination)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  tenantdb-storage                           │
//! │   StorageBackend → Transaction → Table → Cursor             │
//! │   (create_table, transaction, get/put/delete, scans)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    MemoryBackend                            │
//! │         (ordered tables, optimistic concurrency)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use tenantdb_storage::{CursorGuard, CursorOptions, MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!     backend.create_table("users").await?;
//!
//!     // Writes are buffered and applied atomically at commit
//!     let mut txn = backend.transaction().await?;
//!     let mut users = txn.table("users")?;
//!     users.put(b"user:1", b"Alice".to_vec())?;
//!     users.put(b"user:2", b"Bob".to_vec())?;
//!     drop(users);
//!     txn.commit().await?;
//!
//!     // Scan with a cursor; the guard releases it on every exit path
//!     let mut txn = backend.transaction().await?;
//!     let users = txn.table("users")?;
//!     let mut cursor = CursorGuard::new(users.forward_cursor(b"user:", CursorOptions::new()).await?);
//!     let mut count = 0;
//!     while cursor.next().is_some() {
//!         count += 1;
//!     }
//!     cursor.err()?;
//!     assert_eq!(count, 2);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`], which wraps potential
//! [`StorageError`] variants. Engines map their internal errors to these
//! standardized error types.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with shared test helpers.
//! - **`failpoints`**: Activates the `fail` injection points inside [`MemoryBackend`]
//!   (`memory-table-get`, `memory-table-put`, `memory-table-delete`, `memory-cursor-next`,
//!   `memory-commit`).

#![deny(unsafe_code)]

pub mod backend;
pub mod cursor;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod transaction;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use cursor::{Cursor, CursorDirection, CursorGuard, CursorOptions, KeyValue};
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use transaction::{Table, Transaction};
