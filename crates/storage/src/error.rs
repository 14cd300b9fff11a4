//! Errors raised by storage engines.
//!
//! Every engine maps its internal failures onto [`StorageError`]. Callers
//! built on top of the engine (the bucket store, for one) translate these
//! into their own domain errors at the point they cross into their API.
//!
//! # Error Types
//!
//! - [`StorageError::TableNotFound`] - The named table was never provisioned
//! - [`StorageError::Conflict`] - Commit lost an optimistic race
//! - [`StorageError::Internal`] - Anything else the engine could not do
//!
//! A missing *key* is not an error: [`Table::get`](crate::Table::get)
//! returns `Ok(None)`.
//!
//! # Example
//!
//! ```
//! use tenantdb_storage::{StorageError, StorageResult};
//!
//! fn lookup(table: &str) -> StorageResult<Vec<u8>> {
//!     Err(StorageError::table_not_found(table))
//! }
//!
//! assert!(matches!(lookup("bucketsv1"), Err(StorageError::TableNotFound { .. })));
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Shared, thread-safe error used as a `#[source]`.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result of an engine operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// Engine failure.
///
/// Marked `#[non_exhaustive]`: matches outside this crate need a `_` arm.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested table does not exist in the engine.
    #[error("Table not found: {table}")]
    TableNotFound {
        /// Name of the missing table.
        table: String,
    },

    /// Transaction conflict due to optimistic concurrency control.
    ///
    /// Another transaction committed a write to a key this transaction read
    /// or wrote. The caller (or its transaction manager) decides whether to
    /// retry; the engine never does.
    #[error("Transaction conflict")]
    Conflict,

    /// Failure with no more specific category, such as an injected fault.
    #[error("Internal error: {message}")]
    Internal {
        /// What the engine was doing.
        message: String,
        /// Underlying cause, when one exists.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// `TableNotFound` for `table`.
    #[must_use]
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound { table: table.into() }
    }

    #[must_use]
    pub fn conflict() -> Self {
        Self::Conflict
    }

    /// `Internal` without a cause.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// `Internal` wrapping `source`.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// `true` for [`StorageError::Conflict`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}
