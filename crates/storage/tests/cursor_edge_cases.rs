//! Cursor seek, direction, and prefix edge case tests.
//!
//! Tests cover: empty tables, seeks past either end of the keyspace, prefix
//! scans next to neighbouring prefixes, `0xFF` boundary keys, and cursor
//! release on early exit.

#![allow(clippy::expect_used, clippy::panic)]

use rstest::rstest;
use tenantdb_storage::{
    CursorDirection, CursorGuard, CursorOptions, MemoryBackend, StorageBackend, StorageResult,
    testutil::{make_key, populated_backend, scan_all},
};

async fn backend_with_keys(keys: &[&[u8]]) -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.create_table("t").await.expect("create table");
    let mut txn = backend.transaction().await.expect("txn");
    {
        let mut t = txn.table("t").expect("open");
        for key in keys {
            t.put(key, key.to_vec()).expect("put");
        }
    }
    txn.commit().await.expect("commit");
    backend
}

async fn scan(backend: &MemoryBackend, seek: &[u8], options: CursorOptions) -> Vec<Vec<u8>> {
    let mut txn = backend.transaction().await.expect("txn");
    let t = txn.table("t").expect("open");
    let mut cursor = CursorGuard::new(t.forward_cursor(seek, options).await.expect("cursor"));
    let mut keys = Vec::new();
    while let Some(kv) = cursor.next() {
        keys.push(kv.key.to_vec());
    }
    cursor.err().expect("no terminal error");
    keys
}

fn desc() -> CursorOptions {
    CursorOptions::new().with_direction(CursorDirection::Descending)
}

// ============================================================================
// Seek Boundaries
// ============================================================================

#[rstest]
#[case::ascending(CursorOptions::new())]
#[case::descending(desc())]
#[tokio::test]
async fn empty_table_yields_nothing(#[case] options: CursorOptions) {
    let backend = backend_with_keys(&[]).await;
    assert!(scan(&backend, b"", options).await.is_empty());
    assert_eq!(backend.open_cursors(), 0);
}

#[rstest]
#[case::before_first(b"0".as_slice(), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()])]
#[case::between(b"ab".as_slice(), vec![b"b".to_vec(), b"c".to_vec()])]
#[case::exact(b"c".as_slice(), vec![b"c".to_vec()])]
#[case::past_last(b"d".as_slice(), vec![])]
#[tokio::test]
async fn ascending_seek_boundaries(#[case] seek: &[u8], #[case] expected: Vec<Vec<u8>>) {
    let backend = backend_with_keys(&[b"a", b"b", b"c"]).await;
    assert_eq!(scan(&backend, seek, CursorOptions::new()).await, expected);
}

#[rstest]
#[case::before_first(b"0".as_slice(), vec![])]
#[case::between(b"bb".as_slice(), vec![b"b".to_vec(), b"a".to_vec()])]
#[case::exact(b"a".as_slice(), vec![b"a".to_vec()])]
#[case::past_last(b"z".as_slice(), vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()])]
#[tokio::test]
async fn descending_seek_boundaries(#[case] seek: &[u8], #[case] expected: Vec<Vec<u8>>) {
    let backend = backend_with_keys(&[b"a", b"b", b"c"]).await;
    assert_eq!(scan(&backend, seek, desc()).await, expected);
}

/// A descending seek on a prefix starts at the last key under it, not at the
/// prefix itself.
#[tokio::test]
async fn descending_prefix_seek_starts_at_last_match() {
    let backend = backend_with_keys(&[b"org1", b"org1/a", b"org1/z", b"org2/a"]).await;
    let keys = scan(&backend, b"org1/", desc().with_prefix(b"org1/")).await;
    assert_eq!(keys, [b"org1/z".to_vec(), b"org1/a".to_vec()]);
}

// ============================================================================
// Prefix Handling
// ============================================================================

/// Neighbouring prefixes that sort on both sides are never included.
#[rstest]
#[case::ascending(CursorOptions::new().with_prefix(b"b/"), vec![b"b/1".to_vec(), b"b/2".to_vec()])]
#[case::descending(desc().with_prefix(b"b/"), vec![b"b/2".to_vec(), b"b/1".to_vec()])]
#[tokio::test]
async fn prefix_excludes_neighbours(#[case] options: CursorOptions, #[case] expected: Vec<Vec<u8>>) {
    let backend = backend_with_keys(&[b"a/9", b"b", b"b/1", b"b/2", b"b0", b"c/1"]).await;
    assert_eq!(scan(&backend, b"b/", options).await, expected);
}

#[tokio::test]
async fn prefix_of_max_bytes() {
    let backend = backend_with_keys(&[b"\xfe", b"\xff", b"\xff\x00", b"\xff\xff"]).await;

    let asc = scan(&backend, b"\xff", CursorOptions::new().with_prefix(b"\xff")).await;
    assert_eq!(asc, [b"\xff".to_vec(), b"\xff\x00".to_vec(), b"\xff\xff".to_vec()]);

    let descending = scan(&backend, b"\xff", desc().with_prefix(b"\xff")).await;
    assert_eq!(descending, [b"\xff\xff".to_vec(), b"\xff\x00".to_vec(), b"\xff".to_vec()]);
}

#[tokio::test]
async fn prefix_with_no_matches() {
    let backend = backend_with_keys(&[b"a/1", b"c/1"]).await;
    assert!(scan(&backend, b"b/", CursorOptions::new().with_prefix(b"b/")).await.is_empty());
    assert!(scan(&backend, b"b/", desc().with_prefix(b"b/")).await.is_empty());
}

#[rstest]
#[case::ascending(CursorOptions::new(), 0)]
#[case::descending(desc(), 249)]
#[tokio::test]
async fn large_prefix_scan_visits_every_key(#[case] options: CursorOptions, #[case] first: usize) {
    let backend = populated_backend("items", "item", 250).await;
    {
        let mut txn = backend.transaction().await.expect("txn");
        txn.table("items").expect("open").put(b"other:000000", b"x".to_vec()).expect("put");
        txn.commit().await.expect("commit");
    }

    let entries = scan_all(&backend, "items", b"item:", options.with_prefix(b"item:")).await;
    assert_eq!(entries.len(), 250);
    assert_eq!(entries[0].key.as_ref(), make_key("item", first).as_slice());
    assert_eq!(backend.open_cursors(), 0);
}

// ============================================================================
// Release
// ============================================================================

async fn first_value(backend: &MemoryBackend) -> StorageResult<Option<Vec<u8>>> {
    let mut txn = backend.transaction().await?;
    let t = txn.table("t")?;
    let mut cursor = CursorGuard::new(t.forward_cursor(b"", CursorOptions::new()).await?);
    Ok(cursor.next().map(|kv| kv.value.to_vec()))
}

#[tokio::test]
async fn guard_releases_cursor_on_early_return() {
    let backend = backend_with_keys(&[b"a", b"b", b"c"]).await;

    let value = first_value(&backend).await.expect("scan");
    assert_eq!(value, Some(b"a".to_vec()));
    assert_eq!(backend.open_cursors(), 0);
}

#[tokio::test]
async fn several_open_cursors_are_counted() {
    let backend = backend_with_keys(&[b"a"]).await;
    let mut txn = backend.transaction().await.expect("txn");
    let t = txn.table("t").expect("open");

    let first = CursorGuard::new(t.forward_cursor(b"", CursorOptions::new()).await.expect("cursor"));
    let second = CursorGuard::new(t.forward_cursor(b"", desc()).await.expect("cursor"));
    assert_eq!(backend.open_cursors(), 2);

    drop(first);
    assert_eq!(backend.open_cursors(), 1);
    drop(second);
    assert_eq!(backend.open_cursors(), 0);
}

/// A cursor is a snapshot: writes made after it opened are not observed.
#[tokio::test]
async fn cursor_does_not_observe_later_writes() {
    let backend = backend_with_keys(&[b"a"]).await;
    let mut txn = backend.transaction().await.expect("txn");

    let mut cursor = {
        let t = txn.table("t").expect("open");
        CursorGuard::new(t.forward_cursor(b"", CursorOptions::new()).await.expect("cursor"))
    };
    txn.table("t").expect("open").put(b"b", b"b".to_vec()).expect("put");

    let mut keys = Vec::new();
    while let Some(kv) = cursor.next() {
        keys.push(kv.key.to_vec());
    }
    assert_eq!(keys, [b"a".to_vec()]);
}
