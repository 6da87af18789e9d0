//! Error handling module
//! 
//! Defines the error type returned by HTTP handlers and its mapping to
//! `{ "error": ... }` response bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (missing credentials and the like)
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// Request validation failed
    #[error("Request validation failed: {0}")]
    Validation(String),
    
    /// External API error
    #[error("External API error: {0}")]
    ExternalApi(String),
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::ExternalApi(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    
    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration_error",
            AppError::Validation(_) => "invalid_request_error",
            AppError::ExternalApi(_) => "api_error",
        }
    }
    
    /// Message shown to the browser
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(msg) | AppError::Validation(msg) | AppError::ExternalApi(msg) => msg.clone(),
        }
    }
    
    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(self, AppError::Validation(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        
        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
        }
        
        (status, Json(ErrorBody::new(self.user_message()))).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;
    
    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> AppError {
        AppError::Config(message.into())
    }
    
    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> AppError {
        AppError::Validation(message.into())
    }
    
    /// Create external API error
    pub fn external_api_error(message: impl Into<String>) -> AppError {
        AppError::ExternalApi(message.into())
    }
}
