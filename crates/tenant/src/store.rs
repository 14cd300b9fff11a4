//! The bucket store.
//!
//! [`BucketStore`] keeps every user bucket in two tables of a caller-supplied
//! transaction:
//!
//! ```text
//!   primary table                      index table
//!   ┌──────────────────┬──────────┐    ┌────────────────────────────┬──────────────────┐
//!   │ id (16 hex bytes)│ JSON doc │    │ org id (16 hex) ++ name    │ id (16 hex bytes)│
//!   └──────────────────┴──────────┘    └────────────────────────────┴──────────────────┘
//! ```
//!
//! Each primary record has exactly one index entry under its current
//! organization and name, and vice versa. Every operation that writes keeps
//! both sides in step, and validates before its first write so a rejected
//! call leaves nothing behind in the transaction.
//!
//! System buckets are the exception: they live in neither table and are
//! synthesized by [`get_bucket_by_name`](BucketStorage::get_bucket_by_name)
//! when an organization has no stored bucket of that name.
//!
//! # Transactions
//!
//! Every operation takes the transaction explicitly and never commits or
//! rolls it back. Concurrent creates of the same name are resolved by the
//! engine at commit: the loser's commit fails with a conflict.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tenantdb_storage::{MemoryBackend, StorageBackend};
//! use tenantdb_tenant::{
//!     Bucket, BucketStorage, BucketStore, BucketStoreConfig, Id, RandomIdGenerator,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! let store = BucketStore::new(BucketStoreConfig::default(), Arc::new(RandomIdGenerator::new()))?;
//! store.provision(&backend).await?;
//!
//! let org = Id::new(1);
//! let mut txn = backend.transaction().await?;
//! let created = store
//!     .create_bucket(txn.as_mut(), Bucket::builder().org_id(org).name("metrics").build())
//!     .await?;
//! txn.commit().await?;
//!
//! let mut txn = backend.transaction().await?;
//! let found = store.get_bucket_by_name(txn.as_mut(), org, "metrics").await?;
//! assert_eq!(found.id, created.id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tenantdb_storage::{
    CursorDirection, CursorGuard, CursorOptions, StorageBackend, StorageError, Transaction,
};

use crate::{
    bucket::{Bucket, BucketUpdate, SystemBucket},
    codec,
    config::BucketStoreConfig,
    error::{ConfigError, Result, TenantError},
    generator::{IdGenerator, MAX_ID_GENERATION_ATTEMPTS},
    id::Id,
    keys,
    options::{BucketFilter, FindOptions},
};

/// CRUD and list operations on buckets within a caller-owned transaction.
#[async_trait]
pub trait BucketStorage: Send + Sync {
    /// Reads a stored bucket by id.
    ///
    /// # Errors
    ///
    /// - [`TenantError::BucketNotFound`] if no record exists
    /// - [`TenantError::CorruptBucket`] if the record fails to decode or
    ///   holds an id other than the one it is stored under
    /// - [`TenantError::InvalidId`] for the zero id
    /// - [`TenantError::Internal`] if the read fails
    async fn get_bucket(&self, txn: &mut dyn Transaction, id: Id) -> Result<Bucket>;

    /// Resolves a bucket by organization and name, synthesizing system
    /// buckets that are not stored.
    ///
    /// # Errors
    ///
    /// - [`TenantError::BucketNotFoundByName`] if neither a stored nor a
    ///   system bucket has this name
    /// - [`TenantError::Storage`] if the index read fails
    /// - Any error of [`get_bucket`](Self::get_bucket) for the indexed id
    async fn get_bucket_by_name(
        &self,
        txn: &mut dyn Transaction,
        org_id: Id,
        name: &str,
    ) -> Result<Bucket>;

    /// Lists buckets matching `filter`, one page at a time.
    ///
    /// With an organization, buckets come back in name order through the
    /// index; otherwise in id order through the primary table.
    ///
    /// # Errors
    ///
    /// - [`TenantError::InvalidRequest`] if both filter fields are set
    /// - [`TenantError::Storage`] if the scan ends with a cursor error; the
    ///   buckets collected before the failure are discarded, not returned
    /// - Any decode or lookup error of an individual bucket
    async fn list_buckets(
        &self,
        txn: &mut dyn Transaction,
        filter: &BucketFilter,
        options: Option<FindOptions>,
    ) -> Result<Vec<Bucket>>;

    /// Stores a new bucket, assigning an id if it has none.
    ///
    /// Returns the bucket as stored, with id and timestamps set.
    ///
    /// # Errors
    ///
    /// - [`TenantError::BucketAlreadyExists`] if the organization already
    ///   has a bucket with this name
    /// - [`TenantError::InvalidRequest`] for an empty name or an explicit id
    ///   that is already taken
    /// - [`TenantError::Internal`] if id generation or a write fails
    async fn create_bucket(&self, txn: &mut dyn Transaction, bucket: Bucket) -> Result<Bucket>;

    /// Applies `update` to a stored bucket and returns the result.
    ///
    /// # Errors
    ///
    /// - Any error of [`get_bucket`](Self::get_bucket), unchanged
    /// - [`TenantError::Forbidden`] when renaming a system bucket
    /// - [`TenantError::BucketNameNotUnique`] if the new name is taken
    /// - [`TenantError::Internal`] if a write fails
    async fn update_bucket(
        &self,
        txn: &mut dyn Transaction,
        id: Id,
        update: BucketUpdate,
    ) -> Result<Bucket>;

    /// Removes a stored bucket and its index entry.
    ///
    /// # Errors
    ///
    /// - Any error of [`get_bucket`](Self::get_bucket), unchanged
    /// - [`TenantError::Internal`] if a write fails
    async fn delete_bucket(&self, txn: &mut dyn Transaction, id: Id) -> Result<()>;
}

/// [`BucketStorage`] over a primary table and a name index.
#[derive(Clone)]
pub struct BucketStore {
    config: BucketStoreConfig,
    generator: Arc<dyn IdGenerator>,
}

const _: fn() = || {
    fn assert_bucket_storage<T: BucketStorage>() {}
    assert_bucket_storage::<BucketStore>();
};

impl std::fmt::Debug for BucketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketStore").field("config", &self.config).finish_non_exhaustive()
    }
}

fn write_failed(context: &'static str) -> impl FnOnce(StorageError) -> TenantError {
    move |e| TenantError::internal_with_source(context, e)
}

impl BucketStore {
    /// Creates a store over the tables named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn new(
        config: BucketStoreConfig,
        generator: Arc<dyn IdGenerator>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, generator })
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &BucketStoreConfig {
        &self.config
    }

    /// Creates the primary and index tables on `backend`. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::Storage`] if the backend refuses a table.
    #[tracing::instrument(skip(self, backend))]
    pub async fn provision(&self, backend: &dyn StorageBackend) -> Result<()> {
        backend.create_table(&self.config.bucket_table).await?;
        backend.create_table(&self.config.index_table).await?;
        Ok(())
    }

    fn page(&self, options: Option<FindOptions>) -> FindOptions {
        let mut options = options
            .unwrap_or_else(|| FindOptions::builder().limit(self.config.default_page_size).build());
        if options.limit == 0 || options.limit > self.config.max_page_size {
            options.limit = self.config.max_page_size;
        }
        options
    }

    /// Draws candidates until one is absent from the primary table.
    async fn generate_safe_id(&self, txn: &mut dyn Transaction) -> Result<Id> {
        let table = txn.table(&self.config.bucket_table)?;
        for _ in 0..MAX_ID_GENERATION_ATTEMPTS {
            let id = self.generator.id();
            if !id.is_valid() {
                continue;
            }
            let key = keys::primary_key(id)?;
            let existing = table
                .get(&key)
                .await
                .map_err(|e| TenantError::internal_with_source("failed to probe bucket id", e))?;
            if existing.is_none() {
                return Ok(id);
            }
        }
        Err(TenantError::internal("unable to generate valid id"))
    }

    /// Fails unless `name` is free within `org_id`.
    async fn unique_bucket_name(
        &self,
        txn: &mut dyn Transaction,
        org_id: Id,
        name: &str,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(TenantError::invalid_request("bucket name is empty"));
        }
        let key = keys::index_key(org_id, name)?;
        let index = txn.table(&self.config.index_table)?;
        match index.get(&key).await {
            Ok(None) => Ok(()),
            Ok(Some(_)) => Err(TenantError::already_exists(name)),
            Err(e) => Err(TenantError::internal_with_source("failed to check bucket name", e)),
        }
    }

    async fn list_buckets_by_org(
        &self,
        txn: &mut dyn Transaction,
        org_id: Id,
        options: FindOptions,
    ) -> Result<Vec<Bucket>> {
        let prefix = keys::org_prefix(org_id)?;
        let mut cursor = {
            let index = txn.table(&self.config.index_table)?;
            let cursor_options =
                CursorOptions::new().with_direction(direction(options)).with_prefix(prefix.clone());
            CursorGuard::new(index.forward_cursor(&prefix, cursor_options).await?)
        };

        let mut skipped = 0;
        let mut buckets = Vec::new();
        while let Some(entry) = cursor.next() {
            if skipped < options.offset {
                skipped += 1;
                continue;
            }
            let id = Id::decode(&entry.value)
                .map_err(|e| TenantError::internal_with_source("corrupt bucket index entry", e))?;
            buckets.push(self.get_bucket(txn, id).await?);
            if buckets.len() >= options.limit {
                break;
            }
        }
        cursor.err()?;

        Ok(buckets)
    }
}

fn direction(options: FindOptions) -> CursorDirection {
    if options.descending { CursorDirection::Descending } else { CursorDirection::Ascending }
}

#[async_trait]
impl BucketStorage for BucketStore {
    #[tracing::instrument(skip(self, txn))]
    async fn get_bucket(&self, txn: &mut dyn Transaction, id: Id) -> Result<Bucket> {
        let key = keys::primary_key(id)?;
        let table = txn.table(&self.config.bucket_table)?;
        let stored = table
            .get(&key)
            .await
            .map_err(|e| TenantError::internal_with_source("failed to read bucket", e))?;

        let Some(value) = stored else {
            return Err(TenantError::BucketNotFound);
        };
        let bucket = codec::decode_bucket(&value)?;
        if bucket.id != id {
            tracing::warn!(stored_id = %bucket.id, "stored bucket id does not match its key");
            return Err(TenantError::corrupt(TenantError::invalid_id(format!(
                "record holds id {} but is stored under {id}",
                bucket.id
            ))));
        }
        Ok(bucket)
    }

    #[tracing::instrument(skip(self, txn))]
    async fn get_bucket_by_name(
        &self,
        txn: &mut dyn Transaction,
        org_id: Id,
        name: &str,
    ) -> Result<Bucket> {
        let key = keys::index_key(org_id, name)?;
        let indexed = {
            let index = txn.table(&self.config.index_table)?;
            index.get(&key).await?
        };

        if let Some(value) = indexed {
            let id = Id::decode(&value)
                .map_err(|e| TenantError::internal_with_source("corrupt bucket index entry", e))?;
            return self.get_bucket(txn, id).await;
        }

        match SystemBucket::by_name(name) {
            Some(system) => {
                tracing::debug!(bucket_id = %system.id, "synthesized system bucket");
                Ok(system.for_org(org_id))
            },
            None => Err(TenantError::not_found_by_name(name)),
        }
    }

    #[tracing::instrument(skip(self, txn))]
    async fn list_buckets(
        &self,
        txn: &mut dyn Transaction,
        filter: &BucketFilter,
        options: Option<FindOptions>,
    ) -> Result<Vec<Bucket>> {
        if filter.name.is_some() && filter.organization_id.is_some() {
            return Err(TenantError::invalid_request(
                "cannot list by name within an organization, look the bucket up by name instead",
            ));
        }

        let options = self.page(options);
        if let Some(org_id) = filter.organization_id {
            return self.list_buckets_by_org(txn, org_id, options).await;
        }

        let mut cursor = {
            let table = txn.table(&self.config.bucket_table)?;
            let cursor_options = CursorOptions::new().with_direction(direction(options));
            CursorGuard::new(table.forward_cursor(&[], cursor_options).await?)
        };

        let mut skipped = 0;
        let mut buckets = Vec::new();
        while let Some(entry) = cursor.next() {
            if skipped < options.offset {
                skipped += 1;
                continue;
            }
            let bucket = codec::decode_bucket(&entry.value)?;
            if filter.name.as_ref().is_none_or(|name| *name == bucket.name) {
                buckets.push(bucket);
            }
            if buckets.len() >= options.limit {
                break;
            }
        }
        cursor.err()?;

        Ok(buckets)
    }

    #[tracing::instrument(skip(self, txn, bucket), fields(org_id = %bucket.org_id, name = %bucket.name))]
    async fn create_bucket(&self, txn: &mut dyn Transaction, mut bucket: Bucket) -> Result<Bucket> {
        if bucket.id.is_valid() {
            let key = keys::primary_key(bucket.id)?;
            let table = txn.table(&self.config.bucket_table)?;
            let existing = table
                .get(&key)
                .await
                .map_err(|e| TenantError::internal_with_source("failed to probe bucket id", e))?;
            if existing.is_some() {
                return Err(TenantError::invalid_request(format!(
                    "bucket id {} is already in use",
                    bucket.id
                )));
            }
        } else {
            bucket.id = self.generate_safe_id(txn).await?;
        }

        let primary_key = keys::primary_key(bucket.id)?;
        self.unique_bucket_name(txn, bucket.org_id, &bucket.name).await?;

        let now = Utc::now();
        bucket.created_at = Some(now);
        bucket.updated_at = Some(now);

        let value = codec::encode_bucket(&bucket)?;
        let index_key = keys::index_key(bucket.org_id, &bucket.name)?;

        txn.table(&self.config.index_table)?
            .put(&index_key, primary_key.to_vec())
            .map_err(write_failed("failed to write bucket index"))?;
        txn.table(&self.config.bucket_table)?
            .put(&primary_key, value)
            .map_err(write_failed("failed to write bucket"))?;

        tracing::debug!(bucket_id = %bucket.id, "bucket created");
        Ok(bucket)
    }

    #[tracing::instrument(skip(self, txn, update))]
    async fn update_bucket(
        &self,
        txn: &mut dyn Transaction,
        id: Id,
        update: BucketUpdate,
    ) -> Result<Bucket> {
        let current = self.get_bucket(txn, id).await?;
        let primary_key = keys::primary_key(id)?;

        let mut updated = current.clone();
        updated.updated_at = Some(Utc::now());

        let rename = update.name.filter(|name| *name != current.name);
        if let Some(name) = &rename {
            if current.is_system() {
                return Err(TenantError::forbidden("system bucket names cannot be changed"));
            }
            match self.unique_bucket_name(txn, current.org_id, name).await {
                Ok(()) => {},
                Err(TenantError::BucketAlreadyExists { .. }) => {
                    return Err(TenantError::BucketNameNotUnique);
                },
                Err(e) => return Err(e),
            }
            updated.name.clone_from(name);
        }
        if let Some(description) = update.description {
            updated.description = description;
        }
        if let Some(retention_period) = update.retention_period {
            updated.retention_period = retention_period;
        }

        let value = codec::encode_bucket(&updated)?;

        if rename.is_some() {
            let old_key = keys::index_key(current.org_id, &current.name)?;
            let new_key = keys::index_key(updated.org_id, &updated.name)?;
            let mut index = txn.table(&self.config.index_table)?;
            index.delete(&old_key).map_err(write_failed("failed to remove old bucket index"))?;
            index
                .put(&new_key, primary_key.to_vec())
                .map_err(write_failed("failed to write bucket index"))?;
        }

        txn.table(&self.config.bucket_table)?
            .put(&primary_key, value)
            .map_err(write_failed("failed to write bucket"))?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self, txn))]
    async fn delete_bucket(&self, txn: &mut dyn Transaction, id: Id) -> Result<()> {
        let bucket = self.get_bucket(txn, id).await?;
        let primary_key = keys::primary_key(id)?;
        let index_key = keys::index_key(bucket.org_id, &bucket.name)?;

        txn.table(&self.config.index_table)?
            .delete(&index_key)
            .map_err(write_failed("failed to remove bucket index"))?;
        txn.table(&self.config.bucket_table)?
            .delete(&primary_key)
            .map_err(write_failed("failed to remove bucket"))?;

        Ok(())
    }
}
