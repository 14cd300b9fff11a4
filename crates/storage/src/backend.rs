//! Storage backend trait definition.
//!
//! The [`StorageBackend`] trait is the entry point to a transactional
//! key-value engine: it provisions named tables and hands out
//! [`Transaction`] handles. Everything else happens through the transaction.
//!
//! Domain-specific logic (buckets, their name index, system buckets) lives in
//! repository crates built on top of this trait, not in the engines.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`StorageBackend`] trait
//! 2. Implement corresponding [`Transaction`], [`Table`](crate::Table) and
//!    [`Cursor`](crate::Cursor) types
//! 3. Map engine-specific errors to [`StorageError`](crate::StorageError)
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for a reference implementation.

use async_trait::async_trait;

use crate::{error::StorageResult, transaction::Transaction};

/// Abstract transactional key-value engine.
///
/// Backends are expected to be thread-safe (`Send + Sync`); many
/// transactions may be open at once.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Provisions a named table. Creating an existing table is a no-op.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn create_table(&self, name: &str) -> StorageResult<()>;

    /// Begins a new transaction.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>>;
}
