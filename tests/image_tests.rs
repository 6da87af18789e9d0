//! Image generation tests
//!
//! Drives POST /api/generate-image against a mocked text-to-image provider

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http_body_util::BodyExt;
use httpmock::prelude::*;
use jarvisgate::config::Settings;
use jarvisgate::services::image::status_message;
use jarvisgate::services::ImageOutcome;
use jarvisgate::{create_router_with_state, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const IMAGE_PATH: &str = "/text-to-image/v1";

fn settings_for(server: &MockServer, api_key: Option<&str>) -> Settings {
    let mut env: HashMap<&str, String> = HashMap::from([("CLIPDROP_BASE_URL", server.base_url())]);
    if let Some(key) = api_key {
        env.insert("CLIPDROP_API_KEY", key.to_string());
    }
    Settings::from_lookup(|key| env.get(key).cloned()).expect("valid settings")
}

fn app_for(server: &MockServer, api_key: Option<&str>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::from_settings(settings_for(server, api_key)).expect("state"));
    (create_router_with_state(state.clone()), state)
}

async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-image")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn decode_data_url(url: &str) -> (String, Vec<u8>) {
    let rest = url.strip_prefix("data:").expect("data url");
    let (mime, payload) = rest.split_once(";base64,").expect("base64 data url");
    (mime.to_string(), BASE64.decode(payload).expect("valid base64"))
}

#[tokio::test]
async fn test_image_is_returned_as_data_url() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(IMAGE_PATH)
                .header("x-api-key", "clip-key")
                .body_contains("name=\"prompt\"")
                .body_contains("кот в космосе");
            then.status(200)
                .header("content-type", "image/jpeg")
                .body([0xFF_u8, 0xD8, 0xFF, 0xE0]);
        })
        .await;

    let (app, _) = app_for(&server, Some("clip-key"));
    let (status, body) = post_json(app, json!({"prompt": "кот в космосе"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["imageUrl"], "data:image/jpeg;base64,/9j/4A==");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_png() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(IMAGE_PATH);
            then.status(200).body([0x89_u8, 0x50, 0x4E, 0x47]);
        })
        .await;

    let (_, state) = app_for(&server, Some("clip-key"));
    let outcome = state.images.generate_image("закат").await.unwrap();

    match outcome {
        ImageOutcome::Generated { data_url } => {
            let (mime, bytes) = decode_data_url(&data_url);
            assert_eq!(mime, "image/png");
            assert_eq!(bytes, vec![0x89, 0x50, 0x4E, 0x47]);
        }
        other => panic!("Expected generated image, got {:?}", other),
    }
}

#[tokio::test]
async fn test_out_of_credits_returns_placeholder() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(IMAGE_PATH);
            then.status(402).body("{\"error\":\"Not enough credits\"}");
        })
        .await;

    let prompt = "Футуристический город на закате с летающими машинами и неоном";
    let (app, _) = app_for(&server, Some("clip-key"));
    let (status, body) = post_json(app, json!({ "prompt": prompt })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["error"], status_message(reqwest::StatusCode::PAYMENT_REQUIRED));
    assert!(body.get("success").is_none());

    let (mime, svg) = decode_data_url(body["mockImageUrl"].as_str().unwrap());
    let svg = String::from_utf8(svg).unwrap();
    let preview: String = prompt.chars().take(40).collect();
    assert_eq!(mime, "image/svg+xml");
    assert!(svg.contains(&format!("Запрос: {}...", preview)));
    assert!(!svg.contains(prompt));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_invalid_key_is_an_error_without_placeholder() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(IMAGE_PATH);
            then.status(401);
        })
        .await;

    let (app, _) = app_for(&server, Some("wrong-key"));
    let (status, body) = post_json(app, json!({"prompt": "горы"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Неверный API ключ ClipDrop. Проверьте настройки.");
    assert!(body.get("mockImageUrl").is_none());
    assert!(body.get("fallback").is_none());
}

#[tokio::test]
async fn test_rate_limit_and_unknown_statuses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(IMAGE_PATH).body_contains("limit");
            then.status(429);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(IMAGE_PATH).body_contains("broken");
            then.status(503);
        })
        .await;

    let (_, state) = app_for(&server, Some("clip-key"));

    let limited = state.images.generate_image("limit").await.unwrap();
    assert_eq!(
        limited,
        ImageOutcome::Failed {
            status: 429,
            message: "Превышен лимит запросов. Попробуйте позже.".to_string(),
            placeholder: None,
        }
    );

    match state.images.generate_image("broken").await.unwrap() {
        ImageOutcome::Failed { status, message, placeholder } => {
            assert_eq!(status, 503);
            assert_eq!(message, "ClipDrop API недоступен (503 - Service Unavailable)");
            assert!(placeholder.is_none());
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_prompt_is_rejected_without_upstream_call() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).body([0_u8]);
        })
        .await;

    for body in [json!({}), json!({"prompt": ""}), json!({"prompt": 42}), json!({"prompt": "   "})] {
        let (app, _) = app_for(&server, Some("clip-key"));
        let (status, reply) = post_json(app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["error"], "Prompt is required and must be a string");
    }

    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_missing_api_key_is_a_server_error() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).body([0_u8]);
        })
        .await;

    let (app, state) = app_for(&server, None);
    assert!(!state.images.is_configured());

    let (status, body) = post_json(app, json!({"prompt": "море"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "ClipDrop API key not configured");
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_unreachable_provider_is_a_server_error() {
    let env: HashMap<&str, String> = HashMap::from([
        ("CLIPDROP_API_KEY", "clip-key".to_string()),
        ("CLIPDROP_BASE_URL", "http://127.0.0.1:9".to_string()),
    ]);
    let settings = Settings::from_lookup(|key| env.get(key).cloned()).unwrap();
    let app = create_router_with_state(Arc::new(AppState::from_settings(settings).unwrap()));

    let (status, body) = post_json(app, json!({"prompt": "лес"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate image");
}
