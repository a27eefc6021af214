//! Integration tests for the registry HTTP endpoints

use chrono::Duration;
use indicator_registry::patch::Patch;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{TestRegistry, sample_document, url};

async fn register(client: &reqwest::Client, addr: std::net::SocketAddr, body: String) -> reqwest::Response {
    client
        .post(url(addr, "/v1/register"))
        .header("Content-Type", "application/yaml")
        .body(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;

    let response = reqwest::get(url(addr, "/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_register_status_and_list() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let response = register(&client, addr, sample_document("foo", "1", &["latency"])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let identifier = body["identifier"].as_str().unwrap().to_string();
    assert!(identifier.starts_with("foo-"));

    let response = client
        .post(url(
            addr,
            &format!("/v1/indicator-documents/{identifier}/bulk_status"),
        ))
        .json(&json!([{ "name": "latency", "status": "critical" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let documents: Value = reqwest::get(url(addr, "/v1/indicator-documents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let documents = documents.as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["identifier"], identifier.as_str());
    assert_eq!(documents[0]["product"]["name"], "foo");
    assert_eq!(documents[0]["indicators"][0]["name"], "latency");
    assert_eq!(documents[0]["indicators"][0]["status"]["value"], "critical");
}

#[tokio::test]
async fn test_reregistration_keeps_identifier() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();
    let doc = sample_document("foo", "1", &["latency"]);

    let first: Value = register(&client, addr, doc.clone()).await.json().await.unwrap();
    registry.clock.advance(Duration::seconds(60));
    let second: Value = register(&client, addr, doc).await.json().await.unwrap();

    assert_eq!(first["identifier"], second["identifier"]);
    assert_eq!(registry.documents.len().await, 1);
    assert_eq!(registry.metrics.registrations_total.get(), 2);
}

#[tokio::test]
async fn test_trailing_slash_routes() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(addr, "/v1/register/"))
        .body(sample_document("foo", "1", &["latency"]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = reqwest::get(url(addr, "/v1/indicator-documents/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let documents: Value = response.json().await.unwrap();
    assert_eq!(documents.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_document_is_rejected() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let response = register(&client, addr, "indicators: [".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(registry.documents.is_empty().await);
    assert_eq!(registry.metrics.registration_errors_total.get(), 1);
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let response = register(&client, addr, String::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_errors_are_listed() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let doc = "apiVersion: v0\nproduct:\n  name: foo\nindicators:\n- name: latency\n";
    let response = register(&client, addr, doc.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2, "{errors:?}");
}

#[tokio::test]
async fn test_expired_documents_are_not_listed() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let body: Value = register(&client, addr, sample_document("foo", "1", &["latency"]))
        .await
        .json()
        .await
        .unwrap();
    let identifier = body["identifier"].as_str().unwrap().to_string();

    registry.clock.advance(Duration::seconds(121));

    let documents: Value = reqwest::get(url(addr, "/v1/indicator-documents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(documents.as_array().unwrap().is_empty());

    let response = reqwest::get(url(addr, &format!("/v1/indicator-documents/{identifier}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_single_document() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let body: Value = register(&client, addr, sample_document("foo", "1", &["latency"]))
        .await
        .json()
        .await
        .unwrap();
    let identifier = body["identifier"].as_str().unwrap();

    let document: Value = reqwest::get(url(addr, &format!("/v1/indicator-documents/{identifier}")))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(document["identifier"], identifier);
    assert!(document["indicators"][0]["status"].is_null());
}

#[tokio::test]
async fn test_status_for_unregistered_document_is_accepted() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(addr, "/v1/indicator-documents/unknown-abc/bulk_status"))
        .json(&json!([{ "name": "latency", "status": "critical" }]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        registry
            .statuses
            .get("unknown-abc", "latency")
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_patches_apply_on_registration() {
    let patch = Patch::from_yaml(
        br#"
apiVersion: v0
match:
  product:
    name: foo
    version: 1
operations:
- type: replace
  path: /indicators/name=latency/promQLExpression
  value: patched
- type: remove
  path: /indicators/name=missing
"#,
    )
    .unwrap();

    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![patch]).await;
    let client = reqwest::Client::new();

    let response = register(&client, addr, sample_document("foo", "1", &["latency"])).await;
    assert_eq!(response.status(), StatusCode::OK);

    let documents: Value = reqwest::get(url(addr, "/v1/indicator-documents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(documents[0]["indicators"][0]["promql"], "patched");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    register(&client, addr, sample_document("foo", "1", &["latency"])).await;

    let response = reqwest::get(url(addr, "/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().await.unwrap();
    assert!(text.contains("indicator_registry_registrations_total 1"));
    assert!(text.contains("indicator_registry_registered_documents 1"));
}

#[tokio::test]
async fn test_register_v1_document_with_label_patch() {
    let patch = Patch::from_yaml(
        br#"
apiVersion: v0
match:
  metadata:
    deployment: test-deployment
operations:
- type: replace
  path: /spec/indicators/name=latency/thresholds/level=critical/value
  value: 250
"#,
    )
    .unwrap();

    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![patch]).await;
    let client = reqwest::Client::new();

    let doc = r#"---
apiVersion: indicatorprotocol.io/v1
kind: IndicatorDocument
metadata:
  labels:
    deployment: test-deployment
spec:
  product:
    name: foo
    version: 1
  indicators:
  - name: latency
    promql: latency{deployment="$deployment"}
    thresholds:
    - level: critical
      operator: gt
      value: 100
"#;

    let response = register(&client, addr, doc.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let documents: Value = reqwest::get(url(addr, "/v1/indicator-documents"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let indicator = &documents[0]["indicators"][0];
    assert_eq!(documents[0]["product"]["name"], "foo");
    assert_eq!(documents[0]["metadata"]["deployment"], "test-deployment");
    assert_eq!(indicator["promql"], r#"latency{deployment="test-deployment"}"#);
    assert_eq!(indicator["thresholds"][0]["operator"], "gt");
    assert_eq!(indicator["thresholds"][0]["value"], 250.0);
}
