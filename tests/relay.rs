//! Relay proxy integration tests against a mocked upstream.

use axum::{
    body::Body,
    http::{ header, Method, Request, StatusCode },
    Router,
};
use portfolio_chat::server::{ router, RelayConfig, RelayState };
use serde_json::{ json, Value };
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{ Mock, MockServer, ResponseTemplate };
use wiremock::matchers::{ any, body_json, header as header_eq, method, path };

fn relay(upstream_url: String, api_key: Option<&str>, rate_limit_per_second: u32) -> Router {
    let state = RelayState::new(RelayConfig {
        upstream_url,
        api_key: api_key.map(str::to_owned),
        timeout: Duration::from_secs(5),
        rate_limit_per_second,
    }).unwrap();
    router(state)
}

fn chat_request(method: Method, body: Body) -> Request<Body> {
    Request::builder()
        .uri("/api/chat")
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

fn payload() -> Value {
    json!({
        "model": "deepseek-ai/DeepSeek-V3",
        "messages": [
            {"role": "system", "content": "persona"},
            {"role": "user", "content": "hello"}
        ],
        "temperature": 0.7,
        "max_tokens": 1000
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn get_is_rejected_without_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), Some("secret"), 100);
    let response = app.oneshot(chat_request(Method::GET, Body::empty())).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(read_json(response).await, json!({"error": "Method not allowed"}));
    upstream.verify().await;
}

#[tokio::test]
async fn missing_key_fails_fast() {
    let upstream = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), None, 100);
    let response = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await, json!({"error": "API Key not configured"}));
    upstream.verify().await;
}

#[tokio::test]
async fn post_is_forwarded_with_credential() {
    let upstream = MockServer::start().await;
    let reply = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}}],
        "usage": {"prompt_tokens": 3, "completion_tokens": 1}
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header_eq("authorization", "Bearer secret"))
        .and(header_eq("content-type", "application/json"))
        .and(body_json(payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
        .expect(1)
        .mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), Some("secret"), 100);
    let response = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, reply);
}

#[tokio::test]
async fn upstream_error_status_passes_through() {
    let upstream = MockServer::start().await;
    let error = json!({"code": 20015, "message": "rate limited"});
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(error.clone()))
        .mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), Some("secret"), 100);
    let response = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(read_json(response).await, error);
}

#[tokio::test]
async fn non_json_upstream_is_a_generic_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), Some("secret"), 100);
    let response = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await, json!({"error": "Failed to fetch AI response"}));
}

#[tokio::test]
async fn unreachable_upstream_does_not_leak_details() {
    let app = relay("http://127.0.0.1:1/v1/chat/completions".to_string(), Some("secret"), 100);
    let response = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body, json!({"error": "Failed to fetch AI response"}));
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn rate_limit_rejects_burst() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"choices": [{"message": {"content": "ok"}}]}))
        )
        .expect(1)
        .mount(&upstream).await;

    let app = relay(format!("{}/v1/chat/completions", upstream.uri()), Some("secret"), 1);
    let first = app
        .clone()
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();
    let second = app
        .oneshot(chat_request(Method::POST, Body::from(payload().to_string()))).await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
