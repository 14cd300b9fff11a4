//! Multi-tenant bucket store for tenantdb.
//!
//! Buckets are named, organization-scoped data containers. This crate keeps
//! them in two tables of any [`tenantdb_storage`] engine: a primary table
//! keyed by bucket [`Id`], and an index keyed by organization and name that
//! enforces per-organization name uniqueness and serves name lookups and
//! organization listings.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Caller                                  │
//! │        (begins, commits and rolls back transactions)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  BucketStorage / BucketStore                │
//! │   get, get_by_name, list, create, update, delete            │
//! ├──────────────┬──────────────┬───────────────────────────────┤
//! │  keys        │  codec       │  IdGenerator                  │
//! │  (id, index) │  (JSON)      │  (candidate ids)              │
//! ├──────────────┴──────────────┴───────────────────────────────┤
//! │              tenantdb-storage Transaction                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use tenantdb_storage::{MemoryBackend, StorageBackend};
//! use tenantdb_tenant::{
//!     Bucket, BucketFilter, BucketStorage, BucketStore, BucketStoreConfig, BucketUpdate,
//!     FindOptions, Id, RandomIdGenerator, TenantError,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!     let store = BucketStore::new(BucketStoreConfig::default(), Arc::new(RandomIdGenerator::new()))?;
//!     store.provision(&backend).await?;
//!
//!     let org = Id::new(1);
//!     let mut txn = backend.transaction().await?;
//!     for name in ["a", "b", "c"] {
//!         store.create_bucket(txn.as_mut(), Bucket::builder().org_id(org).name(name).build()).await?;
//!     }
//!     txn.commit().await?;
//!
//!     let mut txn = backend.transaction().await?;
//!     let page = FindOptions::builder().limit(2).descending(true).build();
//!     let buckets = store.list_buckets(txn.as_mut(), &BucketFilter::by_organization(org), Some(page)).await?;
//!     let names: Vec<_> = buckets.iter().map(|b| b.name.as_str()).collect();
//!     assert_eq!(names, ["c", "b"]);
//!
//!     // Renaming moves the index entry
//!     let a = store.get_bucket_by_name(txn.as_mut(), org, "a").await?;
//!     store.update_bucket(txn.as_mut(), a.id, BucketUpdate::builder().name("z").build()).await?;
//!     let missing = store.get_bucket_by_name(txn.as_mut(), org, "a").await;
//!     assert!(matches!(missing, Err(TenantError::BucketNotFoundByName { .. })));
//!     txn.commit().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with deterministic id
//!   generators, store helpers and the `assert_tenant_err!` macro.

#![deny(unsafe_code)]

pub mod bucket;
pub mod codec;
pub mod config;
pub mod error;
pub mod generator;
pub mod id;
pub mod keys;
pub mod options;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;

// Re-export primary types at crate root for convenience
pub use bucket::{
    Bucket, BucketType, BucketUpdate, MONITORING_SYSTEM_BUCKET_ID, MONITORING_SYSTEM_BUCKET_NAME,
    SYSTEM_BUCKETS, SystemBucket, TASKS_SYSTEM_BUCKET_ID, TASKS_SYSTEM_BUCKET_NAME,
};
pub use config::BucketStoreConfig;
pub use error::{ConfigError, ErrorCode, Result, TenantError};
pub use generator::{IdGenerator, MAX_ID_GENERATION_ATTEMPTS, RandomIdGenerator};
pub use id::{ID_LENGTH, Id};
pub use options::{BucketFilter, FindOptions};
pub use store::{BucketStorage, BucketStore};
