//! Integration tests
//!
//! Test end-to-end functionality of the entire application

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use axum_test::TestServer;
use httpmock::prelude::*;
use jarvisgate::config::settings::{DEFAULT_APOLOGY, DEFAULT_GREETING};
use jarvisgate::config::Settings;
use jarvisgate::handlers::chat::SELF_TEST_PROMPT;
use jarvisgate::{create_router, create_router_with_state, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Create test settings from explicit values
fn create_test_settings(pairs: &[(&str, String)]) -> Settings {
    let env: HashMap<&str, String> = pairs.iter().cloned().collect();
    Settings::from_lookup(|key| env.get(key).cloned()).expect("Failed to create test settings")
}

/// Settings whose text routes point at the mock server
fn mocked_settings(server: &MockServer) -> Settings {
    create_test_settings(&[
        ("OPENROUTER_API_KEYS", "or-key-1,or-key-2".to_string()),
        ("GROQ_API_KEY", "groq-key".to_string()),
        ("OPENROUTER_BASE_URL", server.url("/openrouter")),
        ("GROQ_BASE_URL", server.url("/groq")),
        ("CLIPDROP_BASE_URL", server.base_url()),
    ])
}

fn app(settings: Settings) -> Router {
    create_router_with_state(Arc::new(AppState::from_settings(settings).expect("Failed to create state")))
}

fn completion(content: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_router(create_test_settings(&[])).await.expect("Failed to create router");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health_response = read_json(response).await;
    assert_eq!(health_response["status"], "healthy");
    assert_eq!(health_response["service"], "Jarvis Gateway");
    assert!(health_response["version"].is_string());
    assert!(health_response["timestamp"].is_string());
    assert_eq!(health_response["details"]["image_provider"], "not_configured");
    assert_eq!(health_response["details"]["text_routes"], json!([]));
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let server = TestServer::new(app(create_test_settings(&[]))).unwrap();

    let live = server.get("/health/live").await;
    live.assert_status_ok();
    assert_eq!(live.json::<Value>()["status"], "alive");

    // No credentials: every chat would end in the apology
    let ready = server.get("/health/ready").await;
    ready.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready.json::<Value>()["status"], "not_ready");

    let configured = TestServer::new(app(create_test_settings(&[("GROQ_API_KEY", "gsk".to_string())]))).unwrap();
    let ready = configured.get("/health/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["details"]["text_routes"], json!(["groq"]));
}

#[tokio::test]
async fn test_chat_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openrouter/chat/completions")
                .header("authorization", "Bearer or-key-1")
                .header("x-title", "Jarvis AI Assistant")
                .body_contains("\"content\":\"Сделай кнопку\"")
                .body_contains("\"role\":\"assistant\",\"content\":\"Какую?\"");
            then.status(200).json_body(completion("Вот   пример   кнопки на React."));
        })
        .await;

    let app = app(mocked_settings(&server));
    let body = json!({
        "messages": [
            { "text": "Привет", "isUser": true },
            { "text": "Какую?", "isUser": false },
            { "text": "Сделай кнопку", "isUser": true }
        ]
    });

    let response = app.oneshot(chat_request(&body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Latin words are filtered and whitespace collapsed
    let reply = read_json(response).await;
    assert_eq!(reply["response"], "Вот пример кнопки на .");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_chat_without_credentials_returns_apology() {
    let app = app(create_test_settings(&[]));

    let response = app
        .oneshot(chat_request(r#"{"messages":[{"text":"Привет","isUser":true}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["response"], DEFAULT_APOLOGY);
}

#[tokio::test]
async fn test_chat_accepts_non_boolean_is_user() {
    for body in [
        r#"{"messages":[{"text":"Привет","isUser":null}]}"#,
        r#"{"messages":[{"text":"Привет","isUser":1}]}"#,
        r#"{"messages":[{"text":"Привет","isUser":"true"}]}"#,
    ] {
        let response = app(create_test_settings(&[])).oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "body: {}", body);
        assert_eq!(read_json(response).await["response"], DEFAULT_APOLOGY);
    }
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(completion("Не должно вызываться никогда."));
        })
        .await;

    for body in [r#"{"message":"hi"}"#, r#"{"messages":"hi"}"#, "not json"] {
        let response = app(mocked_settings(&server)).oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"], "Invalid messages format");
    }

    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_empty_conversation_still_sends_system_prompt() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openrouter/chat/completions")
                .body_contains("\"messages\":[{\"role\":\"system\"");
            then.status(200).json_body(completion("Здравствуйте! Чем могу помочь?"));
        })
        .await;

    let server_under_test = TestServer::new(app(mocked_settings(&server))).unwrap();
    let response = server_under_test.post("/api/chat").json(&json!({ "messages": [] })).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["response"], "Здравствуйте! Чем могу помочь?");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_short_reply_becomes_greeting() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/openrouter/chat/completions");
            then.status(200).json_body(completion("Да"));
        })
        .await;

    let app = app(mocked_settings(&server));
    let response = app
        .oneshot(chat_request(r#"{"messages":[{"text":"Ок?","isUser":true}]}"#))
        .await
        .unwrap();

    assert_eq!(read_json(response).await["response"], DEFAULT_GREETING);
}

#[tokio::test]
async fn test_self_test_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/groq/chat/completions")
                .body_contains(SELF_TEST_PROMPT);
            then.status(200).json_body(completion("Всё отлично, спасибо!"));
        })
        .await;

    let settings = create_test_settings(&[
        ("GROQ_API_KEY", "groq-key".to_string()),
        ("GROQ_BASE_URL", server.url("/groq")),
    ]);
    let test_server = TestServer::new(app(settings)).unwrap();

    let response = test_server.get("/api/test-ai").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Всё отлично, спасибо!");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_self_test_reports_failure() {
    let test_server = TestServer::new(app(create_test_settings(&[]))).unwrap();

    let response = test_server.get("/api/test-ai").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["response"], DEFAULT_APOLOGY);
}

#[tokio::test]
async fn test_404_handling() {
    let app = app(create_test_settings(&[]));

    let request = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_header() {
    let app = app(create_test_settings(&[]));

    let request = Request::builder().uri("/health/live").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = app(create_test_settings(&[("MAX_REQUEST_SIZE", "64".to_string())]));

    let text = "а".repeat(200);
    let body = json!({ "messages": [{ "text": text, "isUser": true }] }).to_string();
    let response = app.oneshot(chat_request(&body)).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = app(create_test_settings(&[("ALLOWED_ORIGINS", "https://jarvis.example".to_string())]));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "https://jarvis.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://jarvis.example"
    );
}
