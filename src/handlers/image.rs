//! Image generation handler

use crate::handlers::AppState;
use crate::models::{ImageReply, ImageRequest};
use crate::services::ImageOutcome;
use crate::utils::error::{helpers::validation_error, AppError, AppResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Handle image generation requests
/// 
/// POST /api/generate-image
/// 
/// Credits exhaustion answers 200 with a placeholder so the UI can still
/// render something.
pub async fn handle_generate_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> AppResult<Json<ImageReply>> {
    let prompt = match payload {
        Ok(Json(ImageRequest { prompt: Some(prompt) })) if !prompt.is_empty() => prompt,
        Ok(_) => return Err(validation_error("Prompt is required and must be a string")),
        Err(rejection) => {
            debug!("Rejected image body: {}", rejection.body_text());
            return Err(validation_error("Prompt is required and must be a string"));
        }
    };
    
    match state.images.generate_image(&prompt).await? {
        ImageOutcome::Generated { data_url } => Ok(Json(ImageReply::Generated {
            success: true,
            image_url: data_url,
        })),
        ImageOutcome::Failed {
            message,
            placeholder: Some(mock_image_url),
            ..
        } => {
            info!("Image provider out of credits, returning placeholder");
            Ok(Json(ImageReply::Fallback {
                error: message,
                fallback: true,
                mock_image_url,
            }))
        }
        ImageOutcome::Failed { message, .. } => Err(AppError::ExternalApi(message)),
    }
}
