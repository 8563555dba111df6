//! Integration tests for the context registry client

use mcp_client::context::Context;
use mcp_client::error::{ClientError, EXIT_NOT_FOUND};
use serde_json::json;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::test_utils::{closed_port_url, registry_client};

fn sample_context() -> Context {
    Context::from_value(json!({
        "context_name": "summarizer",
        "context_version": "1.0.0",
        "body": {"model": "gpt-4"}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_create_returns_server_context_name_and_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contexts"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_partial_json(json!({"context_name": "summarizer"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "3f2a9c1e-1111-4000-8000-000000000001",
            "context_name": "summarizer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), Some("secret-token"));
    let name = client.create(&sample_context()).await.unwrap();
    assert_eq!(name, "summarizer");
}

#[tokio::test]
async fn test_create_without_name_in_response_reports_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    assert_eq!(client.create(&sample_context()).await.unwrap(), "unknown");
}

#[tokio::test]
async fn test_create_rejected_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(422).set_body_string("context_name is required"))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    match client.create(&Context::default()).await {
        Err(ClientError::RequestFailed { status, body }) => {
            assert_eq!(status, 422);
            assert_eq!(body, "context_name is required");
        }
        other => panic!("expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_returns_full_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contexts/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc",
            "context_name": "summarizer",
            "body": {"model": "gpt-4"},
            "created_at": "2024-05-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    let context = client.get("abc").await.unwrap();
    assert_eq!(context.id(), Some("abc"));
    assert_eq!(context.model(), Some("gpt-4"));
    assert!(context.get("created_at").is_some());
}

#[tokio::test]
async fn test_get_missing_is_not_found_with_distinct_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contexts/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    let err = client.get("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.exit_code(), EXIT_NOT_FOUND);
    assert_eq!(err.to_string(), "Context missing not found");
}

#[tokio::test]
async fn test_http_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contexts/abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    let err = client.get("abc").await.unwrap_err();
    assert!(matches!(err, ClientError::RequestFailed { status: 500, .. }));
}

#[tokio::test]
async fn test_list_empty_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contexts": []})))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    let list = client.list().await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_list_references() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contexts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contexts": [
                {"id": "a1", "context_name": "alpha"},
                {"id": "b2", "context_name": "beta"}
            ]
        })))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    let list = client.list().await.unwrap();
    let names: Vec<&str> = list
        .contexts
        .iter()
        .map(|c| c.context_name.as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_delete_success_and_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/contexts/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": "abc"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/contexts/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = registry_client(&server.uri(), None);
    client.delete("abc").await.unwrap();
    assert!(client.delete("gone").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_unreachable_server_is_connection_failure() {
    let server = closed_port_url();
    let client = registry_client(&server, None);
    match client.list().await {
        Err(ClientError::ConnectionFailure { server: tried, .. }) => assert_eq!(tried, server),
        other => panic!("expected ConnectionFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dropped_connections_use_exactly_three_attempts() {
    // Accepts each connection and closes it without replying.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server = format!("http://{}", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    let client = registry_client(&server, None);
    let err = client.get("abc").await.unwrap_err();

    assert!(matches!(err, ClientError::ConnectionFailure { .. }));
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
}
