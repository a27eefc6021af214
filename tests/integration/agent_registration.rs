//! Agent tests against a mock registry

use indicator_registry::actors::agent::AgentHandle;
use indicator_registry::config::AgentConfig;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::sample_document;

fn agent_config(registry_uri: String, dir: &tempfile::TempDir) -> AgentConfig {
    AgentConfig {
        registry_uri,
        // long enough that only the first tick and explicit requests fire
        interval_secs: 3600,
        documents_glob: format!("{}/*.yml", dir.path().display()),
    }
}

#[tokio::test]
async fn test_agent_registers_every_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .and(header("content-type", "application/yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"identifier":"x"}"#))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("foo.yml"), sample_document("foo", "1", &["latency"])).unwrap();
    std::fs::write(dir.path().join("bar.yml"), sample_document("bar", "2", &["errors"])).unwrap();
    std::fs::write(dir.path().join("ignored.txt"), "not a document").unwrap();

    let handle = AgentHandle::spawn(&agent_config(mock_server.uri(), &dir)).unwrap();

    assert_eq!(handle.register_now().await.unwrap(), 2);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);
    assert!(
        requests
            .iter()
            .any(|r| String::from_utf8_lossy(&r.body).contains("name: foo"))
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rejected_document_does_not_stop_the_others() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .and(body_string_contains("name: broken"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad"}"#))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.yml"), sample_document("broken", "1", &["x"])).unwrap();
    std::fs::write(dir.path().join("b.yml"), sample_document("foo", "1", &["latency"])).unwrap();
    std::fs::write(dir.path().join("c.yml"), sample_document("bar", "1", &["errors"])).unwrap();

    let handle = AgentHandle::spawn(&agent_config(mock_server.uri(), &dir)).unwrap();

    assert_eq!(handle.register_now().await.unwrap(), 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_agent_handles_registry_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("foo.yml"), sample_document("foo", "1", &["latency"])).unwrap();

    let handle = AgentHandle::spawn(&agent_config(mock_server.uri(), &dir)).unwrap();

    // a failing registry is not an agent error, nothing is accepted
    assert_eq!(handle.register_now().await.unwrap(), 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_agent_with_no_documents() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let handle = AgentHandle::spawn(&agent_config(mock_server.uri(), &dir)).unwrap();

    assert_eq!(handle.register_now().await.unwrap(), 0);

    handle.shutdown().await.unwrap();
}

#[cfg(feature = "api")]
#[tokio::test]
async fn test_agent_against_real_registry() {
    use chrono::Duration;

    use crate::helpers::TestRegistry;

    let registry = TestRegistry::new(Duration::seconds(120));
    let addr = registry.spawn_api(vec![]).await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("foo.yml"), sample_document("foo", "1", &["latency"])).unwrap();
    std::fs::write(dir.path().join("bar.yml"), sample_document("bar", "1", &["errors"])).unwrap();

    let handle = AgentHandle::spawn(&agent_config(format!("http://{addr}/"), &dir)).unwrap();

    assert_eq!(handle.register_now().await.unwrap(), 2);
    assert_eq!(registry.documents.len().await, 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_agent_registers_more_documents_than_in_flight_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    for i in 0..12 {
        std::fs::write(
            dir.path().join(format!("doc-{i}.yml")),
            sample_document(&format!("product-{i}"), "1", &["latency"]),
        )
        .unwrap();
    }

    let handle = AgentHandle::spawn(&agent_config(mock_server.uri(), &dir)).unwrap();

    assert_eq!(handle.register_now().await.unwrap(), 12);
    assert_eq!(handle.register_now().await.unwrap(), 12);

    handle.shutdown().await.unwrap();
}
