//! Text-generation fallback policy
//!
//! Runs the configured routes in a fixed order and returns the first
//! completion, sanitized. When every route is exhausted the caller gets the
//! fixed apology; the policy itself never fails.

use super::cascade::{CompletionStage, SoftFailure};
use super::provider::ChatRoute;
use super::sanitizer::Sanitizer;
use crate::config::Settings;
use crate::models::{ChatMessage, ChatRole};
use crate::utils::logging::conversation_log_summary;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the returned text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// A completion from the named route
    Route(String),
    /// Every route was exhausted (or none was enabled)
    Apology,
}

/// Reply plus the soft failures seen while producing it
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub text: String,
    pub source: ReplySource,
    pub diagnostics: Vec<SoftFailure>,
}

/// Ordered cascade of text routes
pub struct Responder {
    stages: Vec<Arc<dyn CompletionStage>>,
    persona: String,
    apology: String,
    sanitizer: Sanitizer,
}

impl Responder {
    pub fn new(
        stages: Vec<Arc<dyn CompletionStage>>,
        persona: impl Into<String>,
        apology: impl Into<String>,
        sanitizer: Sanitizer,
    ) -> Self {
        Self {
            stages,
            persona: persona.into(),
            apology: apology.into(),
            sanitizer,
        }
    }

    /// Build the cascade from settings, one [`ChatRoute`] per configured route
    pub fn from_settings(settings: &Settings, client: Client) -> Self {
        let stages = settings
            .text
            .routes
            .iter()
            .map(|route| {
                Arc::new(ChatRoute::new(client.clone(), route.clone(), settings.text.sampling.clone()))
                    as Arc<dyn CompletionStage>
            })
            .collect();

        Self::new(
            stages,
            settings.text.persona.clone(),
            settings.text.apology.clone(),
            Sanitizer::new(&settings.sanitizer),
        )
    }

    /// Stages in the order they are tried
    pub fn stages(&self) -> &[Arc<dyn CompletionStage>] {
        &self.stages
    }

    /// Whether any stage can issue a request
    pub fn has_enabled_stage(&self) -> bool {
        self.stages.iter().any(|stage| stage.is_enabled())
    }

    /// Prepend the system prompt to a caller conversation
    ///
    /// Caller-supplied system messages are dropped; the persona is always
    /// the only system message and always first.
    pub fn with_system_prompt(&self, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(self.persona.clone()));

        let before = conversation.len();
        messages.extend(conversation.iter().filter(|m| m.role != ChatRole::System).cloned());
        if messages.len() - 1 != before {
            debug!("Dropped {} caller system messages", before - (messages.len() - 1));
        }

        messages
    }

    /// Generate a reply with diagnostics
    pub async fn generate(&self, conversation: &[ChatMessage]) -> GenerationReport {
        let messages = self.with_system_prompt(conversation);
        if let Ok(summary) = serde_json::to_string_pretty(&conversation_log_summary(&messages)) {
            debug!("📥 Conversation:\n{}", summary);
        }

        let mut diagnostics = Vec::new();

        for stage in &self.stages {
            if !stage.is_enabled() {
                debug!("Skipping route without credentials: {}", stage.name());
                continue;
            }

            match stage.complete(&messages, &mut diagnostics).await {
                Some(raw) => {
                    info!("Reply obtained from {} after {} failed attempts", stage.name(), diagnostics.len());
                    return GenerationReport {
                        text: self.sanitizer.sanitize(&raw),
                        source: ReplySource::Route(stage.name().to_string()),
                        diagnostics,
                    };
                }
                None => warn!("Route {} exhausted, falling back", stage.name()),
            }
        }

        if diagnostics.is_empty() {
            warn!("No text route has credentials configured");
        } else {
            error!("All text routes failed ({} attempts)", diagnostics.len());
        }

        GenerationReport {
            text: self.apology.clone(),
            source: ReplySource::Apology,
            diagnostics,
        }
    }

    /// Generate a reply; never fails and never returns empty text
    pub async fn generate_response(&self, conversation: &[ChatMessage]) -> String {
        self.generate(conversation).await.text
    }
}
