//! Integration tests for HttpFetcher.
//!
//! Uses wiremock for HTTP mocking. Tests cover the subject query parameter,
//! custom headers, envelope decoding and status mapping (401/403/404/5xx).

use std::collections::BTreeMap;
use std::time::Duration;

use warden_authz::{AuthzError, HttpFetcher, PolicyFetcher, WARDEN_USER_AGENT};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &str = r#"{"m":"model","p":[["p","alice","data1","read"]]}"#;

fn endpoint(mock_server: &MockServer) -> String {
    format!("{}/casbin", mock_server.uri())
}

fn create_test_fetcher(mock_server: &MockServer) -> HttpFetcher {
    HttpFetcher::new(&endpoint(mock_server), &BTreeMap::new()).expect("failed to create fetcher")
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .and(query_param("subject", "alice"))
        .and(header("user-agent", WARDEN_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "ok",
            "data": PAYLOAD
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    let data = fetcher.fetch("alice").await.expect("fetch failed");

    assert_eq!(data, PAYLOAD);
}

#[tokio::test]
async fn test_fetch_sends_custom_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "ok",
            "data": PAYLOAD
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("Authorization".to_string(), "Bearer secret-token".to_string());
    headers.insert("X-Tenant".to_string(), "acme".to_string());
    let fetcher = HttpFetcher::new(&endpoint(&mock_server), &headers).unwrap();

    assert!(fetcher.fetch("alice").await.is_ok());
}

#[tokio::test]
async fn test_fetch_encodes_subject() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .and(query_param("subject", "bob smith&co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "ok",
            "data": "{}"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    assert_eq!(fetcher.fetch("bob smith&co").await.unwrap(), "{}");
}

#[tokio::test]
async fn test_fetch_message_is_optional() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": PAYLOAD })),
        )
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    assert_eq!(fetcher.fetch("alice").await.unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_fetch_invalid_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    let result = fetcher.fetch("alice").await;

    assert!(matches!(result, Err(AuthzError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_fetch_unauthorized() {
    let mock_server = MockServer::start().await;

    for status in [401, 403] {
        mock_server.reset().await;
        Mock::given(method("GET"))
            .and(path("/casbin"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let fetcher = create_test_fetcher(&mock_server);
        let result = fetcher.fetch("alice").await;
        assert!(
            matches!(result, Err(AuthzError::Unauthorized { .. })),
            "status {} should map to Unauthorized: {:?}",
            status,
            result
        );
    }
}

#[tokio::test]
async fn test_fetch_server_error_carries_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    match fetcher.fetch("alice").await {
        Err(AuthzError::Network { message }) => {
            assert!(message.contains("503"), "message: {}", message);
            assert!(message.contains("maintenance"), "message: {}", message);
        }
        other => panic!("expected Network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = create_test_fetcher(&mock_server);
    let result = fetcher.fetch("alice").await;

    assert!(matches!(result, Err(AuthzError::Network { .. })));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casbin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "message": "ok", "data": PAYLOAD }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_timeout(
        &endpoint(&mock_server),
        &BTreeMap::new(),
        Duration::from_millis(100),
    )
    .unwrap();
    let result = fetcher.fetch("alice").await;

    assert!(matches!(result, Err(AuthzError::Network { .. })));
}
