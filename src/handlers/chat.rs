//! Chat handlers
//! 
//! Converts the UI transcript into a conversation and runs it through the
//! text fallback policy

use crate::handlers::AppState;
use crate::models::{ChatMessage, ChatReply, ChatRequest, SelfTestReply};
use crate::services::ReplySource;
use crate::utils::error::{helpers::validation_error, AppResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Conversation used by the self-test endpoint
pub const SELF_TEST_PROMPT: &str = "Привет! Как дела?";

/// Handle chat requests
/// 
/// POST /api/chat
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatReply>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected chat body: {}", rejection.body_text());
            return Err(validation_error("Invalid messages format"));
        }
    };
    
    let conversation = request.into_conversation();
    debug!("Received chat request with {} messages", conversation.len());
    
    let report = state.responder.generate(&conversation).await;
    if !report.diagnostics.is_empty() {
        debug!("Chat reply needed {} failed attempts", report.diagnostics.len());
    }
    
    Ok(Json(ChatReply { response: report.text }))
}

/// Self-test
/// 
/// GET /api/test-ai
/// Sends a canned greeting through the full cascade
pub async fn handle_self_test(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SelfTestReply>) {
    let report = state
        .responder
        .generate(&[ChatMessage::user(SELF_TEST_PROMPT)])
        .await;
    
    match report.source {
        ReplySource::Route(route) => {
            debug!("Self-test answered by {}", route);
            (
                StatusCode::OK,
                Json(SelfTestReply {
                    success: true,
                    response: report.text,
                    message: "AI service is working correctly".to_string(),
                }),
            )
        }
        ReplySource::Apology => {
            warn!("Self-test failed after {} attempts", report.diagnostics.len());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SelfTestReply {
                    success: false,
                    response: report.text,
                    message: "AI service test failed".to_string(),
                }),
            )
        }
    }
}
