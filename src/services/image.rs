//! Image-generation fallback policy
//!
//! One text-to-image call per prompt. A credits-exhausted answer degrades to
//! a locally rendered placeholder; every other failure is reported as is.

use super::placeholder::placeholder_data_url;
use crate::config::ImageConfig;
use crate::utils::error::helpers::{config_error, external_api_error, validation_error};
use crate::utils::error::AppResult;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

/// MIME type assumed when the provider does not declare one
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Result of one image request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// The provider returned an image
    Generated { data_url: String },
    /// The provider refused; `placeholder` is set for quota exhaustion only
    Failed {
        status: u16,
        message: String,
        placeholder: Option<String>,
    },
}

/// Map a provider status to the message shown to the user
pub fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::PAYMENT_REQUIRED => {
            "На аккаунте ClipDrop закончились кредиты. Проверьте баланс аккаунта.".to_string()
        }
        StatusCode::UNAUTHORIZED => "Неверный API ключ ClipDrop. Проверьте настройки.".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Превышен лимит запросов. Попробуйте позже.".to_string(),
        StatusCode::BAD_REQUEST => {
            "Неверный запрос к ClipDrop API. Проверьте текст описания.".to_string()
        }
        other => format!(
            "ClipDrop API недоступен ({} - {})",
            other.as_u16(),
            other.canonical_reason().unwrap_or("Unknown")
        ),
    }
}

/// Text-to-image client
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    client: Client,
    config: ImageConfig,
}

impl ImageGenerator {
    pub fn new(client: Client, config: ImageConfig) -> Self {
        Self { client, config }
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        let base_url = self.config.base_url.trim_end_matches('/');
        format!("{}/text-to-image/v1", base_url)
    }

    /// Generate an image for `prompt`
    ///
    /// Errors are reserved for bad input, missing configuration and
    /// transport failures; provider refusals come back as
    /// [`ImageOutcome::Failed`].
    pub async fn generate_image(&self, prompt: &str) -> AppResult<ImageOutcome> {
        if prompt.trim().is_empty() {
            return Err(validation_error("Prompt is required and must be a string"));
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| config_error("ClipDrop API key not configured"))?;

        info!("Generating image (prompt: {} chars)", prompt.chars().count());

        let form = Form::new().text("prompt", prompt.to_string());

        let response = self
            .client
            .post(self.build_url())
            .header("x-api-key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Image provider request failed: {}", e);
                external_api_error("Failed to generate image")
            })?;

        let status = response.status();

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Image provider error: {} - {}", status, detail);

            let placeholder = (status == StatusCode::PAYMENT_REQUIRED).then(|| placeholder_data_url(prompt));
            return Ok(ImageOutcome::Failed {
                status: status.as_u16(),
                message: status_message(status),
                placeholder,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read image body: {}", e);
            external_api_error("Failed to generate image")
        })?;

        debug!("Image received: {} bytes of {}", bytes.len(), content_type);

        Ok(ImageOutcome::Generated {
            data_url: format!("data:{};base64,{}", content_type, BASE64.encode(&bytes)),
        })
    }
}
