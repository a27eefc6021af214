//! Concurrency tests for registration and status updates
//!
//! Many clients hit the registry at once; every accepted request must be
//! visible afterwards and identical content must collapse to one entry.

use std::sync::Arc;

use chrono::Duration;
use indicator_registry::clock::Clock;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{TestRegistry, sample_document, url};

#[tokio::test]
async fn test_concurrent_registrations_of_distinct_documents() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let mut tasks = vec![];
    for i in 0..20 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .post(url(addr, "/v1/register"))
                .body(sample_document(&format!("product-{i}"), "1", &["latency"]))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(registry.documents.len().await, 20);
    assert_eq!(registry.metrics.registrations_total.get(), 20);
}

#[tokio::test]
async fn test_concurrent_registrations_of_identical_content() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let mut tasks = vec![];
    for _ in 0..20 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let response: Value = client
                .post(url(addr, "/v1/register"))
                .body(sample_document("foo", "1", &["latency"]))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            response["identifier"].as_str().unwrap().to_string()
        }));
    }

    let mut identifiers = vec![];
    for task in tasks {
        identifiers.push(task.await.unwrap());
    }

    identifiers.dedup();
    assert_eq!(identifiers.len(), 1);
    assert_eq!(registry.documents.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_status_updates() {
    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;
    let client = reqwest::Client::new();

    let names: Vec<String> = (0..10).map(|i| format!("indicator_{i}")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let response: Value = client
        .post(url(addr, "/v1/register"))
        .body(sample_document("foo", "1", &name_refs))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let identifier = response["identifier"].as_str().unwrap().to_string();

    let mut tasks = vec![];
    for name in names.clone() {
        let client = client.clone();
        let identifier = identifier.clone();
        tasks.push(tokio::spawn(async move {
            client
                .post(url(
                    addr,
                    &format!("/v1/indicator-documents/{identifier}/bulk_status"),
                ))
                .json(&json!([{ "name": name, "status": "warning" }]))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let statuses = registry.statuses.for_document(&identifier).await;
    assert_eq!(statuses.len(), 10);
    assert!(statuses.values().all(|s| s.value == "warning"));
    assert_eq!(registry.metrics.status_updates_total.get(), 10);
}

#[tokio::test]
async fn test_sweep_races_with_refresh() {
    let registry = TestRegistry::new(Duration::seconds(60));
    let documents = Arc::clone(&registry.documents);

    let start = registry.clock.now();
    documents.register("foo-1", b"doc", start).await;

    // sweep evaluates against a time at which the old registration has expired,
    // while a refresh lands at that same moment
    let later = start + Duration::seconds(61);

    let refresh = {
        let documents = Arc::clone(&documents);
        tokio::spawn(async move { documents.register("foo-1", b"doc", later).await })
    };
    let sweep = {
        let documents = Arc::clone(&documents);
        tokio::spawn(async move { documents.sweep(later, Duration::seconds(60)).await })
    };

    refresh.await.unwrap();
    let removed = sweep.await.unwrap();

    // either the sweep ran first and the refresh re-inserted, or the refresh
    // won and the sweep saw a fresh entry
    assert!(removed.len() <= 1);
    assert!(documents.get("foo-1").await.is_some());
}
