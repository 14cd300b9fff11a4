//! Configuration for the bucket store.
//!
//! [`BucketStoreConfig`] names the two tables the store uses and sets its
//! pagination limits. Table names are per-store, so isolated stores can
//! share one backend.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default name of the primary table.
pub const DEFAULT_BUCKET_TABLE: &str = "bucketsv1";

/// Default name of the index table.
pub const DEFAULT_INDEX_TABLE: &str = "bucketindexv1";

/// Page size used when a list call passes no options.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a list call returns.
pub const MAX_PAGE_SIZE: usize = 100;

/// Configuration for [`BucketStore`](crate::BucketStore).
///
/// # Example
///
/// ```
/// use tenantdb_tenant::BucketStoreConfig;
///
/// let config = BucketStoreConfig::builder()
///     .bucket_table("test_buckets")
///     .index_table("test_bucket_index")
///     .max_page_size(50)
///     .build()?;
///
/// assert_eq!(config.default_page_size(), 20);
/// # Ok::<(), tenantdb_tenant::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketStoreConfig {
    /// Primary table: encoded id to bucket record.
    #[serde(default = "default_bucket_table")]
    pub(crate) bucket_table: String,

    /// Index table: org id and name to encoded id.
    #[serde(default = "default_index_table")]
    pub(crate) index_table: String,

    /// Page size when no options are given.
    #[serde(default = "default_page_size")]
    pub(crate) default_page_size: usize,

    /// Upper bound on any page.
    #[serde(default = "default_max_page_size")]
    pub(crate) max_page_size: usize,
}

fn default_bucket_table() -> String {
    DEFAULT_BUCKET_TABLE.to_owned()
}

fn default_index_table() -> String {
    DEFAULT_INDEX_TABLE.to_owned()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    MAX_PAGE_SIZE
}

impl Default for BucketStoreConfig {
    fn default() -> Self {
        Self {
            bucket_table: default_bucket_table(),
            index_table: default_index_table(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[bon::bon]
impl BucketStoreConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Optional Fields
    ///
    /// * `bucket_table` - Primary table name (default: `bucketsv1`).
    /// * `index_table` - Index table name (default: `bucketindexv1`).
    /// * `default_page_size` - Page size without options (default: 20).
    /// * `max_page_size` - Largest page (default: 100).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a table name is empty, both tables share a
    /// name, or the page sizes are out of range.
    #[builder]
    pub fn new(
        #[builder(into, default = default_bucket_table())] bucket_table: String,
        #[builder(into, default = default_index_table())] index_table: String,
        #[builder(default = DEFAULT_PAGE_SIZE)] default_page_size: usize,
        #[builder(default = MAX_PAGE_SIZE)] max_page_size: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { bucket_table, index_table, default_page_size, max_page_size };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants [`new`](Self::new) enforces.
    ///
    /// Deserialized configurations skip the builder, so the store calls this
    /// before accepting one.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_table.is_empty() {
            return Err(ConfigError::EmptyTableName { field: "bucket_table" });
        }
        if self.index_table.is_empty() {
            return Err(ConfigError::EmptyTableName { field: "index_table" });
        }
        if self.bucket_table == self.index_table {
            return Err(ConfigError::SharedTable { name: self.bucket_table.clone() });
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::PageSizeOutOfRange {
                field: "max_page_size",
                value: 0,
                min: 1,
                max: usize::MAX,
            });
        }
        if !(1..=self.max_page_size).contains(&self.default_page_size) {
            return Err(ConfigError::PageSizeOutOfRange {
                field: "default_page_size",
                value: self.default_page_size,
                min: 1,
                max: self.max_page_size,
            });
        }
        Ok(())
    }

    /// Returns the primary table name.
    #[must_use]
    pub fn bucket_table(&self) -> &str {
        &self.bucket_table
    }

    /// Returns the index table name.
    #[must_use]
    pub fn index_table(&self) -> &str {
        &self.index_table
    }

    /// Returns the page size used when no options are given.
    #[must_use]
    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Returns the largest page size.
    #[must_use]
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }
}
