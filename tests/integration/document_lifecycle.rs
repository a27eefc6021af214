//! End-to-end flow through the library without the HTTP layer:
//! process → register → status → merge → expiry

use chrono::Duration;
use indicator_registry::{
    clock::Clock,
    document::{IndicatorDocument, process_document},
    patch::Patch,
    registry::merge,
};
use pretty_assertions::assert_eq;

use crate::helpers::{TestRegistry, sample_document};

#[tokio::test]
async fn registered_document_is_listed_with_status() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let bytes = sample_document("foo", "1", &["latency", "errors"]);

    let processed = process_document(&[], bytes.as_bytes()).unwrap();
    registry
        .documents
        .register(&processed.identifier, &processed.canonical, registry.clock.now())
        .await;
    registry
        .statuses
        .set_status(&processed.identifier, "latency", "critical", registry.clock.now())
        .await;

    let entries = registry.documents.list(registry.clock.now()).await;
    assert_eq!(entries.len(), 1);

    let document: IndicatorDocument = serde_json::from_slice(&entries[0].bytes).unwrap();
    let statuses = registry.statuses.for_document(&entries[0].identifier).await;
    let view = merge(&entries[0].identifier, &document, |_, name| {
        statuses.get(name).cloned()
    });

    assert_eq!(view.identifier, processed.identifier);
    assert_eq!(view.indicators[0].indicator.name, "latency");
    assert_eq!(
        view.indicators[0].status.as_ref().map(|s| s.value.as_str()),
        Some("critical")
    );
    assert_eq!(view.indicators[1].status, None);
    assert_eq!(
        view.indicators[0].indicator.promql,
        r#"latency{deployment="test-deployment"}"#
    );
}

#[tokio::test]
async fn status_overlay_leaves_stored_bytes_untouched() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let processed =
        process_document(&[], sample_document("foo", "1", &["latency"]).as_bytes()).unwrap();

    registry
        .documents
        .register(&processed.identifier, &processed.canonical, registry.clock.now())
        .await;
    let before = registry.documents.get(&processed.identifier).await.unwrap();

    registry
        .statuses
        .set_status(&processed.identifier, "latency", "warning", registry.clock.now())
        .await;

    let after = registry.documents.get(&processed.identifier).await.unwrap();
    assert_eq!(before.bytes, after.bytes);
}

#[tokio::test]
async fn document_expires_unless_refreshed() {
    let ttl = Duration::seconds(120);
    let registry = TestRegistry::new(ttl);
    let processed =
        process_document(&[], sample_document("foo", "1", &["latency"]).as_bytes()).unwrap();

    let registered_at = registry.clock.now();
    registry
        .documents
        .register(&processed.identifier, &processed.canonical, registered_at)
        .await;

    registry.clock.advance(Duration::seconds(100));
    registry
        .documents
        .register(&processed.identifier, &processed.canonical, registry.clock.now())
        .await;

    // past the original deadline but inside the refreshed one
    registry.clock.advance(Duration::seconds(100));
    let now = registry.clock.now();
    assert!(registry.documents.sweep(now, ttl).await.is_empty());
    assert_eq!(registry.documents.list(now).await.len(), 1);

    registry.clock.advance(Duration::seconds(21));
    let now = registry.clock.now();
    assert_eq!(registry.documents.sweep(now, ttl).await.len(), 1);
    assert!(registry.documents.list(now).await.is_empty());
}

#[tokio::test]
async fn patched_content_gets_its_own_identifier() {
    let patch = Patch::from_yaml(
        br#"
apiVersion: v0
match:
  metadata:
    deployment: test-deployment
operations:
- type: replace
  path: /indicators/0/promQLExpression
  value: patched
"#,
    )
    .unwrap();
    let bytes = sample_document("foo", "1", &["latency"]);

    let plain = process_document(&[], bytes.as_bytes()).unwrap();
    let patched = process_document(&[patch], bytes.as_bytes()).unwrap();

    assert_eq!(patched.document.indicators[0].promql, "patched");
    assert_ne!(plain.identifier, patched.identifier);
    assert!(patched.identifier.starts_with("foo-"));
}
