//! Error taxonomy for the bucket store.
//!
//! Every storage failure is translated into a [`TenantError`] at the point it
//! crosses into the store's API. Callers branch on [`TenantError::code`]
//! rather than on message text.
//!
//! | Variant | [`ErrorCode`] |
//! |---------|---------------|
//! | [`BucketNotFound`](TenantError::BucketNotFound), [`BucketNotFoundByName`](TenantError::BucketNotFoundByName) | `NotFound` |
//! | [`BucketAlreadyExists`](TenantError::BucketAlreadyExists), [`BucketNameNotUnique`](TenantError::BucketNameNotUnique) | `Conflict` |
//! | [`InvalidRequest`](TenantError::InvalidRequest), [`InvalidId`](TenantError::InvalidId) | `Invalid` |
//! | [`UnprocessableBucket`](TenantError::UnprocessableBucket) | `Unprocessable` |
//! | [`Forbidden`](TenantError::Forbidden) | `Forbidden` |
//! | [`CorruptBucket`](TenantError::CorruptBucket), [`Internal`](TenantError::Internal) | `Internal` |
//! | [`Storage`](TenantError::Storage) | `Conflict` for engine conflicts, otherwise `Internal` |

use std::{fmt, sync::Arc};

use tenantdb_storage::{BoxError, StorageError};
use thiserror::Error;

/// Result type alias for bucket store operations.
pub type Result<T> = std::result::Result<T, TenantError>;

/// Broad category of a [`TenantError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The requested entity does not exist.
    NotFound,
    /// The request collides with existing state.
    Conflict,
    /// The request itself is malformed.
    Invalid,
    /// The entity could not be encoded for storage.
    Unprocessable,
    /// The request is well-formed but not permitted.
    Forbidden,
    /// Unexpected storage or data failure.
    Internal,
}

impl ErrorCode {
    /// Stable lowercase name of the category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::Unprocessable => "unprocessable entity",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by bucket store operations.
///
/// # Non-exhaustive
///
/// New variants may be added without a semver-breaking change. Downstream
/// match expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TenantError {
    /// No bucket is stored under the requested id.
    #[error("Bucket not found")]
    BucketNotFound,

    /// No bucket with the requested name exists in the organization.
    #[error("Bucket \"{name}\" not found")]
    BucketNotFoundByName {
        /// The name that was looked up.
        name: String,
    },

    /// A bucket with this name already exists in the organization.
    #[error("Bucket with name {name} already exists")]
    BucketAlreadyExists {
        /// The conflicting name.
        name: String,
    },

    /// A rename target is already taken in the organization.
    #[error("Bucket name is not unique")]
    BucketNameNotUnique,

    /// The request is malformed (bad filter combination, empty name).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// An identifier failed to encode or decode.
    #[error("Invalid id: {message}")]
    InvalidId {
        /// Description of the failure.
        message: String,
        /// The underlying decoding error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// A stored bucket record failed to decode.
    #[error("Bucket is corrupt")]
    CorruptBucket {
        /// The decoding error.
        #[source]
        source: BoxError,
    },

    /// A bucket record failed to encode.
    #[error("Bucket is unprocessable")]
    UnprocessableBucket {
        /// The encoding error.
        #[source]
        source: BoxError,
    },

    /// The operation is not permitted on this bucket.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Why the operation was refused.
        message: String,
    },

    /// Unexpected storage failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// Storage error passed through untranslated: table lookups, cursor
    /// creation and terminal cursor errors.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TenantError {
    /// Creates a `BucketNotFoundByName` error.
    #[must_use]
    pub fn not_found_by_name(name: impl Into<String>) -> Self {
        Self::BucketNotFoundByName { name: name.into() }
    }

    /// Creates a `BucketAlreadyExists` error.
    #[must_use]
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::BucketAlreadyExists { name: name.into() }
    }

    /// Creates an `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Creates an `InvalidId` error without a source.
    #[must_use]
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId { message: message.into(), source: None }
    }

    /// Creates an `InvalidId` error wrapping a decoding failure.
    #[must_use]
    pub fn invalid_id_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidId { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a `CorruptBucket` error.
    #[must_use]
    pub fn corrupt(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::CorruptBucket { source: Arc::new(source) }
    }

    /// Creates an `UnprocessableBucket` error.
    #[must_use]
    pub fn unprocessable(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UnprocessableBucket { source: Arc::new(source) }
    }

    /// Creates a `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    /// Creates an `Internal` error without a source.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates an `Internal` error with a source.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BucketNotFound | Self::BucketNotFoundByName { .. } => ErrorCode::NotFound,
            Self::BucketAlreadyExists { .. } | Self::BucketNameNotUnique => ErrorCode::Conflict,
            Self::InvalidRequest { .. } | Self::InvalidId { .. } => ErrorCode::Invalid,
            Self::UnprocessableBucket { .. } => ErrorCode::Unprocessable,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::CorruptBucket { .. } | Self::Internal { .. } => ErrorCode::Internal,
            Self::Storage(err) if err.is_conflict() => ErrorCode::Conflict,
            Self::Storage(_) => ErrorCode::Internal,
        }
    }

    /// Returns `true` if this error means the entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code() == ErrorCode::NotFound
    }
}

/// Errors raised when validating a [`BucketStoreConfig`](crate::BucketStoreConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A table name was empty.
    #[error("{field} cannot be empty")]
    EmptyTableName {
        /// The offending field.
        field: &'static str,
    },

    /// Both tables were configured with the same name.
    #[error("bucket_table and index_table must differ, both are \"{name}\"")]
    SharedTable {
        /// The shared name.
        name: String,
    },

    /// A page size was outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    PageSizeOutOfRange {
        /// The offending field.
        field: &'static str,
        /// The configured value.
        value: usize,
        /// Smallest allowed value.
        min: usize,
        /// Largest allowed value.
        max: usize,
    },
}
