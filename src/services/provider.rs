//! OpenAI-compatible text route
//!
//! Sweeps a route's model list, rotating credentials for each model, and
//! returns the first well-formed completion.

use super::cascade::{first_success, CompletionStage, FailureKind, SoftFailure, StepOutcome};
use super::credentials::{Credential, CredentialPool};
use crate::config::RouteConfig;
use crate::models::{ChatMessage, CompletionRequest, CompletionResponse, SamplingParams, UpstreamErrorResponse};
use crate::utils::logging::mask_credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Build the shared upstream HTTP client
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("jarvisgate/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// One text provider route
pub struct ChatRoute {
    client: Client,
    config: RouteConfig,
    pool: CredentialPool,
    sampling: SamplingParams,
}

impl ChatRoute {
    /// Create a route; its credential pool is taken from the config
    pub fn new(client: Client, config: RouteConfig, sampling: SamplingParams) -> Self {
        let pool = CredentialPool::new(config.api_keys.clone());
        Self { client, config, pool, sampling }
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        let base_url = self.config.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }

    fn soft_failure(&self, model: &str, credential: Credential<'_>, kind: FailureKind) -> StepOutcome<String> {
        // Single-key routes do not rotate, so the slot carries no information
        let credential_slot = (self.pool.len() > 1).then_some(credential.slot);
        StepOutcome::SoftFailure(SoftFailure {
            route: self.config.name.clone(),
            model: model.to_string(),
            credential_slot,
            kind,
        })
    }

    /// Issue one request with the next credential in the pool
    async fn attempt(&self, model: &str, messages: &[ChatMessage]) -> StepOutcome<String> {
        let Some(credential) = self.pool.next_credential() else {
            return StepOutcome::SoftFailure(SoftFailure {
                route: self.config.name.clone(),
                model: model.to_string(),
                credential_slot: None,
                kind: FailureKind::Transport("no credentials configured".to_string()),
            });
        };

        debug!(
            "Sending {} completion request (model: {}, key: {})",
            self.config.name,
            model,
            mask_credential(credential.secret)
        );

        let body = CompletionRequest {
            model,
            messages,
            sampling: &self.sampling,
            stream: self.config.disable_streaming.then_some(false),
        };

        let mut request = self
            .client
            .post(self.build_url())
            .bearer_auth(credential.secret)
            .header("Content-Type", "application/json");
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.json(&body).send().await {
            Ok(response) => response,
            Err(e) => return self.soft_failure(model, credential, FailureKind::Transport(e.to_string())),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return self.soft_failure(model, credential, FailureKind::Transport(e.to_string())),
        };

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<UpstreamErrorResponse>(&text) {
                debug!("{} error detail: {}", self.config.name, error_response.error.message);
            }
            let kind = FailureKind::Status {
                code: status.as_u16(),
                text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            };
            return self.soft_failure(model, credential, kind);
        }

        let parsed: CompletionResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => return self.soft_failure(model, credential, FailureKind::MalformedPayload(e.to_string())),
        };

        match parsed.into_content() {
            Some(content) => {
                info!("{} completion succeeded (model: {})", self.config.name, model);
                StepOutcome::Success(content)
            }
            None => self.soft_failure(
                model,
                credential,
                FailureKind::MalformedPayload("missing choices[0].message.content".to_string()),
            ),
        }
    }
}

#[async_trait]
impl CompletionStage for ChatRoute {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_enabled(&self) -> bool {
        !self.pool.is_empty() && !self.config.models.is_empty()
    }

    async fn complete(&self, messages: &[ChatMessage], diagnostics: &mut Vec<SoftFailure>) -> Option<String> {
        let attempts = self.pool.attempts_per_model(self.config.max_key_attempts);
        let steps = self
            .config
            .models
            .iter()
            .flat_map(|model| std::iter::repeat(model.as_str()).take(attempts))
            .collect::<Vec<&str>>();

        first_success(steps, |model| self.attempt(model, messages), diagnostics).await
    }
}
