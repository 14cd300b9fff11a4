//! Integration test verifying that `#[instrument]` annotations produce
//! the expected spans on `MemoryBackend` operations.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use tenantdb_storage::{MemoryBackend, StorageBackend};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer, records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

fn install_collector() -> (Arc<Mutex<Vec<String>>>, tracing::subscriber::DefaultGuard) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    let subscriber = tracing_subscriber::registry().with(collector);
    (spans, tracing::subscriber::set_default(subscriber))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_table_creates_span() {
    let (spans, _guard) = install_collector();

    let backend = MemoryBackend::new();
    backend.create_table("t").await.expect("create table should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "create_table"),
        "expected a 'create_table' span, got: {recorded:?}"
    );
}

#[tokio::test]
async fn transaction_and_commit_create_spans() {
    let (spans, _guard) = install_collector();

    let backend = MemoryBackend::new();
    backend.create_table("t").await.expect("create table should succeed");
    let mut txn = backend.transaction().await.expect("transaction should succeed");
    txn.table("t").expect("open").put(b"k", b"v".to_vec()).expect("put should succeed");
    txn.commit().await.expect("commit should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["transaction", "commit"] {
        assert!(recorded.iter().any(|s| s == name), "expected a '{name}' span, got: {recorded:?}");
    }
}

#[tokio::test]
async fn rollback_creates_span() {
    let (spans, _guard) = install_collector();

    let backend = MemoryBackend::new();
    let txn = backend.transaction().await.expect("transaction should succeed");
    txn.rollback().await.expect("rollback should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "rollback"),
        "expected a 'rollback' span, got: {recorded:?}"
    );
}
