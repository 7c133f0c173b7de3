use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_api_client::{ApiClient, StaticTokenStore};
use shared_config::AppConfig;

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let config = AppConfig::with_base_url(server.uri());
    let store = match token {
        Some(token) => StaticTokenStore::new(token),
        None => StaticTokenStore::anonymous(),
    };
    ApiClient::with_token_store(&config, Arc::new(store))
}

#[tokio::test]
async fn test_request_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "role": "patient"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("secret-token"));
    let body: Value = client.request(Method::GET, "/auth/me", None).await.unwrap();

    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_request_posts_json_body() {
    let mock_server = MockServer::start().await;
    let payload = json!({"durationMinutes": 30});

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let body: Value = client
        .request(Method::POST, "/api/appointments/book", Some(payload))
        .await
        .unwrap();

    assert_eq!(body["id"], 10);
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Slot already booked"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("t"));

    let err = client
        .request::<Value>(Method::POST, "/api/appointments/book", Some(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Conflict: Slot already booked");

    let err = client
        .request::<Value>(Method::GET, "/api/notifications", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication error: expired");
}

#[tokio::test]
async fn test_request_empty_ignores_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/appointments/availability/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("t"));
    client
        .request_empty(Method::DELETE, "/api/appointments/availability/4", None)
        .await
        .unwrap();
}
