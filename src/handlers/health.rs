//! Health check handlers
//! 
//! Provides application health status check endpoints

use crate::handlers::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::debug;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
    /// Timestamp
    pub timestamp: String,
    /// Details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// Check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDetails {
    /// Text routes that have credentials, in cascade order
    pub text_routes: Vec<String>,
    /// Image provider status
    pub image_provider: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Record the process start time (first call wins)
pub fn mark_started() {
    START_TIME.get_or_init(Instant::now);
}

/// Get service uptime in seconds
fn get_uptime_seconds() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}

fn details(state: &AppState) -> HealthDetails {
    let text_routes = state
        .responder
        .stages()
        .iter()
        .filter(|stage| stage.is_enabled())
        .map(|stage| stage.name().to_string())
        .collect();
    
    let image_provider = if state.images.is_configured() {
        "configured"
    } else {
        "not_configured"
    };
    
    HealthDetails {
        text_routes,
        image_provider: image_provider.to_string(),
        uptime_seconds: get_uptime_seconds(),
    }
}

fn response(status: &str, details: Option<HealthDetails>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: "Jarvis Gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        details,
    }
}

/// Basic health check
/// 
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");
    Json(response("healthy", Some(details(&state))))
}

/// Readiness check
/// 
/// GET /health/ready
/// Ready once at least one text route has credentials; without any the
/// chat endpoint can only apologise.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Executing readiness check");
    
    if state.responder.has_enabled_stage() {
        (StatusCode::OK, Json(response("ready", Some(details(&state)))))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response("not_ready", Some(details(&state)))))
    }
}

/// Liveness check
/// 
/// GET /health/live
/// Does not look at providers
pub async fn liveness_check() -> Json<HealthResponse> {
    debug!("Executing liveness check");
    
    Json(response(
        "alive",
        Some(HealthDetails {
            text_routes: Vec::new(),
            image_provider: "not_checked".to_string(),
            uptime_seconds: get_uptime_seconds(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    
    fn create_test_state(keys: Option<&str>) -> Arc<AppState> {
        let settings = Settings::from_lookup(|key| match key {
            "OPENROUTER_API_KEYS" => keys.map(|k| k.to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(AppState::from_settings(settings).unwrap())
    }
    
    #[tokio::test]
    async fn test_health_check() {
        let response = health_check(State(create_test_state(Some("sk-or-test-1,sk-or-test-2")))).await.0;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "Jarvis Gateway");
        assert_eq!(response.details.unwrap().text_routes, vec!["openrouter".to_string()]);
    }
    
    #[tokio::test]
    async fn test_readiness_without_credentials() {
        let (status, body) = readiness_check(State(create_test_state(None))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.0.status, "not_ready");
    }
    
    #[tokio::test]
    async fn test_liveness_check() {
        let response = liveness_check().await.0;
        assert_eq!(response.status, "alive");
        assert!(response.details.is_some());
    }
    
    #[test]
    fn test_uptime_calculation() {
        mark_started();
        let uptime1 = get_uptime_seconds();
        std::thread::sleep(std::time::Duration::from_millis(100));
        let uptime2 = get_uptime_seconds();
        assert!(uptime2 >= uptime1);
    }
}
