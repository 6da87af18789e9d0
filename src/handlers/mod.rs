//! HTTP handlers module
//! 
//! Contains all HTTP endpoint handling logic

pub mod chat;
pub mod health;
pub mod image;

use crate::config::Settings;
use crate::middleware::request_logging_middleware;
use crate::services::{build_http_client, ImageGenerator, Responder};
use anyhow::Result;
use axum::{http::HeaderValue, middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Application state
pub struct AppState {
    pub settings: Settings,
    pub responder: Arc<Responder>,
    pub images: ImageGenerator,
}

impl AppState {
    /// Build the production state from settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = build_http_client(settings.request.timeout)?;
        let responder = Arc::new(Responder::from_settings(&settings, client.clone()));
        let images = ImageGenerator::new(client, settings.image.clone());
        
        Ok(Self {
            settings,
            responder,
            images,
        })
    }
}

/// Create application router
pub async fn create_router(settings: Settings) -> Result<Router> {
    let state = AppState::from_settings(settings)?;
    Ok(create_router_with_state(Arc::new(state)))
}

/// Create application router around an existing state
pub fn create_router_with_state(app_state: Arc<AppState>) -> Router {
    health::mark_started();
    
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(RequestBodyLimitLayer::new(app_state.settings.request.max_request_size));
    
    let router = Router::new()
        .route("/api/chat", post(chat::handle_chat))
        .route("/api/generate-image", post(image::handle_generate_image))
        .route("/api/test-ai", get(chat::handle_self_test))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .layer(middleware_stack);
    
    let router = if app_state.settings.security.cors_enabled {
        router.layer(cors_layer(&app_state.settings.security.allowed_origins))
    } else {
        router
    };
    
    router.with_state(app_state)
}

/// Build the CORS layer from the allowed origin list
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    
    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    
    layer.allow_origin(AllowOrigin::list(origins))
}
