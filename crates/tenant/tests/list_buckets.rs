//! Integration tests for bucket listing and pagination.
//!
//! Tests cover: organization-scoped listings in both directions, offsets,
//! page size clamping, the unscoped name filter, the filter combination
//! rejection, and cursor release on every exit path.

#![allow(clippy::expect_used, clippy::panic)]

use rstest::rstest;
use tenantdb_storage::{MemoryBackend, StorageBackend};
use tenantdb_tenant::{
    Bucket, BucketFilter, BucketStorage, BucketStore, FindOptions, Id, TenantError,
    assert_tenant_err,
    testutil::{create_committed, new_store},
};

const ORG1: Id = Id::new(1);
const ORG2: Id = Id::new(2);

// ============================================================================
// Test Helpers
// ============================================================================

async fn seeded(names: &[&str]) -> (MemoryBackend, BucketStore) {
    let (backend, store) = new_store().await;
    for name in names {
        create_committed(&backend, &store, ORG1, name).await;
    }
    (backend, store)
}

async fn list_names(
    backend: &MemoryBackend,
    store: &BucketStore,
    filter: BucketFilter,
    options: Option<FindOptions>,
) -> Vec<String> {
    let mut txn = backend.transaction().await.expect("txn");
    let buckets = store.list_buckets(txn.as_mut(), &filter, options).await.expect("list");
    assert_eq!(backend.open_cursors(), 0, "list must release its cursor");
    buckets.into_iter().map(|b| b.name).collect()
}

fn page(limit: usize, offset: usize, descending: bool) -> Option<FindOptions> {
    Some(FindOptions::builder().limit(limit).offset(offset).descending(descending).build())
}

// ============================================================================
// Organization Listings
// ============================================================================

#[tokio::test]
async fn org_listing_pages_in_name_order() {
    let (backend, store) = seeded(&["c", "a", "b"]).await;
    let filter = BucketFilter::by_organization(ORG1);

    let ascending = list_names(&backend, &store, filter.clone(), page(2, 0, false)).await;
    assert_eq!(ascending, ["a", "b"]);

    let descending = list_names(&backend, &store, filter, page(2, 0, true)).await;
    assert_eq!(descending, ["c", "b"]);
}

#[rstest]
#[case::skip_one_ascending(1, false, &["b", "c"])]
#[case::skip_one_descending(1, true, &["b", "a"])]
#[case::skip_all(3, false, &[])]
#[case::skip_past_end(10, true, &[])]
#[tokio::test]
async fn org_listing_honours_offset(
    #[case] offset: usize,
    #[case] descending: bool,
    #[case] expected: &[&str],
) {
    let (backend, store) = seeded(&["a", "b", "c"]).await;
    let names =
        list_names(&backend, &store, BucketFilter::by_organization(ORG1), page(0, offset, descending))
            .await;
    assert_eq!(names, expected);
}

#[tokio::test]
async fn org_listing_excludes_other_orgs() {
    let (backend, store) = seeded(&["shared", "mine"]).await;
    create_committed(&backend, &store, ORG2, "shared").await;
    create_committed(&backend, &store, ORG2, "theirs").await;

    let mine = list_names(&backend, &store, BucketFilter::by_organization(ORG1), None).await;
    assert_eq!(mine, ["mine", "shared"]);

    let theirs = list_names(&backend, &store, BucketFilter::by_organization(ORG2), page(0, 0, true))
        .await;
    assert_eq!(theirs, ["theirs", "shared"]);
}

#[tokio::test]
async fn org_listing_of_empty_org() {
    let (backend, store) = seeded(&["a"]).await;
    let names = list_names(&backend, &store, BucketFilter::by_organization(Id::new(9)), None).await;
    assert!(names.is_empty());
}

#[tokio::test]
async fn org_listing_sees_uncommitted_buckets() {
    let (backend, store) = new_store().await;
    let mut txn = backend.transaction().await.expect("txn");
    for name in ["y", "x"] {
        store
            .create_bucket(txn.as_mut(), Bucket::builder().org_id(ORG1).name(name).build())
            .await
            .expect("create");
    }

    let buckets = store
        .list_buckets(txn.as_mut(), &BucketFilter::by_organization(ORG1), None)
        .await
        .expect("list");
    let names: Vec<_> = buckets.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["x", "y"]);
}

// ============================================================================
// Page Size Clamping
// ============================================================================

async fn many_buckets(count: usize) -> (MemoryBackend, BucketStore) {
    let (backend, store) = new_store().await;
    let mut txn = backend.transaction().await.expect("txn");
    for i in 0..count {
        let bucket = Bucket::builder().org_id(ORG1).name(format!("bucket-{i:04}")).build();
        store.create_bucket(txn.as_mut(), bucket).await.expect("create");
    }
    txn.commit().await.expect("commit");
    (backend, store)
}

#[rstest]
#[case::no_options(None, 20)]
#[case::zero_limit(page(0, 0, false), 100)]
#[case::over_max(page(500, 0, false), 100)]
#[case::small(page(3, 0, false), 3)]
#[tokio::test]
async fn limit_is_clamped(#[case] options: Option<FindOptions>, #[case] expected: usize) {
    let (backend, store) = many_buckets(120).await;

    let by_org =
        list_names(&backend, &store, BucketFilter::by_organization(ORG1), options).await;
    assert_eq!(by_org.len(), expected);

    let all = list_names(&backend, &store, BucketFilter::all(), options).await;
    assert_eq!(all.len(), expected);
}

// ============================================================================
// Unscoped Listings
// ============================================================================

#[tokio::test]
async fn unscoped_listing_is_in_id_order() {
    let (backend, store) = seeded(&["c", "a", "b"]).await;

    let ascending = list_names(&backend, &store, BucketFilter::all(), None).await;
    assert_eq!(ascending, ["c", "a", "b"]);

    let descending = list_names(&backend, &store, BucketFilter::all(), page(0, 0, true)).await;
    assert_eq!(descending, ["b", "a", "c"]);
}

#[tokio::test]
async fn name_filter_matches_exactly_across_orgs() {
    let (backend, store) = seeded(&["metrics", "metrics-old", "logs"]).await;
    create_committed(&backend, &store, ORG2, "metrics").await;

    let mut txn = backend.transaction().await.expect("txn");
    let buckets = store
        .list_buckets(txn.as_mut(), &BucketFilter::by_name("metrics"), None)
        .await
        .expect("list");

    assert_eq!(buckets.len(), 2);
    assert!(buckets.iter().all(|b| b.name == "metrics"));
    let orgs: Vec<Id> = buckets.iter().map(|b| b.org_id).collect();
    assert_eq!(orgs, [ORG1, ORG2]);
}

#[tokio::test]
async fn offset_counts_scanned_records_before_name_filter() {
    let (backend, store) = seeded(&["keep", "drop", "keep2"]).await;
    create_committed(&backend, &store, ORG2, "keep").await;

    // Records in id order: keep(1), drop(2), keep2(3), keep(4); skipping two
    // leaves keep2 and the second "keep"
    let names =
        list_names(&backend, &store, BucketFilter::by_name("keep"), page(0, 2, false)).await;
    assert_eq!(names, ["keep"]);
}

#[tokio::test]
async fn name_and_org_together_are_invalid() {
    let (backend, store) = seeded(&["a"]).await;
    let mut txn = backend.transaction().await.expect("txn");

    let filter = BucketFilter { name: Some("a".into()), organization_id: Some(ORG1) };
    let result = store.list_buckets(txn.as_mut(), &filter, None).await;
    assert_tenant_err!(result, TenantError::InvalidRequest { .. });
}

#[tokio::test]
async fn zero_org_is_invalid() {
    let (backend, store) = seeded(&["a"]).await;
    let mut txn = backend.transaction().await.expect("txn");

    let result =
        store.list_buckets(txn.as_mut(), &BucketFilter::by_organization(Id::default()), None).await;
    assert_tenant_err!(result, TenantError::InvalidId { .. });
}

// ============================================================================
// Cursor Release
// ============================================================================

#[tokio::test]
async fn corrupt_record_releases_cursor() {
    let (backend, store) = seeded(&["a"]).await;

    let mut txn = backend.transaction().await.expect("txn");
    txn.table(store.config().bucket_table())
        .expect("primary table")
        .put(b"0000000000000000", b"{broken".to_vec())
        .expect("raw put");

    let result = store.list_buckets(txn.as_mut(), &BucketFilter::all(), None).await;
    assert_tenant_err!(result, TenantError::CorruptBucket { .. });
    assert_eq!(backend.open_cursors(), 0);
}

#[tokio::test]
async fn dangling_index_entry_releases_cursor() {
    let (backend, store) = seeded(&["a"]).await;

    let mut txn = backend.transaction().await.expect("txn");
    txn.table(store.config().index_table())
        .expect("index table")
        .put(b"0000000000000001b", b"00000000000000ff".to_vec())
        .expect("raw put");

    let result = store.list_buckets(txn.as_mut(), &BucketFilter::by_organization(ORG1), None).await;
    assert_tenant_err!(result, TenantError::BucketNotFound);
    assert_eq!(backend.open_cursors(), 0);
}
