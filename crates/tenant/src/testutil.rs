//! Shared test utilities for bucket store testing.
//!
//! This module provides deterministic id generators, a ready-to-use store
//! over [`MemoryBackend`], and an assertion macro for [`TenantError`]
//! variants. It is feature-gated behind `testutil` to prevent leaking into
//! production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tenantdb-tenant = { path = "../tenant", features = ["testutil"] }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tenantdb_storage::{MemoryBackend, StorageBackend};

use crate::{
    bucket::Bucket,
    config::BucketStoreConfig,
    generator::IdGenerator,
    id::Id,
    store::{BucketStorage, BucketStore},
};

/// Hands out consecutive ids, starting from a chosen value.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    /// The first call to [`id`](IdGenerator::id) returns `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self { next: AtomicU64::new(first) }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn id(&self) -> Id {
        Id::new(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Always returns the same id; drives id generation into exhaustion.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdGenerator(Id);

impl FixedIdGenerator {
    /// Returns `id` on every call.
    #[must_use]
    pub fn new(id: Id) -> Self {
        Self(id)
    }
}

impl IdGenerator for FixedIdGenerator {
    fn id(&self) -> Id {
        self.0
    }
}

/// Create a provisioned [`MemoryBackend`] and a default-configured store
/// whose ids count up from 1.
///
/// # Panics
///
/// Panics if provisioning fails (should not happen with `MemoryBackend`).
pub async fn new_store() -> (MemoryBackend, BucketStore) {
    let backend = MemoryBackend::new();
    let store = BucketStore::new(
        BucketStoreConfig::default(),
        Arc::new(SequenceIdGenerator::starting_at(1)),
    )
    .expect("default config is valid");
    store.provision(&backend).await.expect("provisioning failed");
    (backend, store)
}

/// Create and commit a user bucket named `name` in organization `org`.
///
/// # Panics
///
/// Panics if the create or the commit fails.
pub async fn create_committed(
    backend: &MemoryBackend,
    store: &BucketStore,
    org: Id,
    name: &str,
) -> Bucket {
    let mut txn = backend.transaction().await.expect("begin failed");
    let bucket = store
        .create_bucket(txn.as_mut(), Bucket::builder().org_id(org).name(name).build())
        .await
        .expect("create failed");
    txn.commit().await.expect("commit failed");
    bucket
}

/// Assert that a result is an `Err` matching the given [`TenantError`]
/// pattern.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use tenantdb_tenant::{TenantError, assert_tenant_err};
///
/// let result: Result<(), TenantError> = Err(TenantError::BucketNotFound);
/// assert_tenant_err!(result, TenantError::BucketNotFound);
/// ```
#[macro_export]
macro_rules! assert_tenant_err {
    ($result:expr, $pattern:pat if $guard:expr $(,)?) => {
        match $result {
            Err($pattern) if $guard => {},
            other => panic!(
                "expected Err({} if {}), got: {:?}",
                stringify!($pattern),
                stringify!($guard),
                other,
            ),
        }
    };
    ($result:expr, $pattern:pat $(,)?) => {
        match $result {
            Err($pattern) => {},
            other => panic!(
                "expected Err({}), got: {:?}",
                stringify!($pattern),
                other,
            ),
        }
    };
}
