//! File-based provider overrides
//!
//! Model lists and prompt wording change far more often than code, so they
//! can be replaced from a JSON file without touching the environment.

use crate::config::settings::RouteConfig;
use crate::models::SamplingParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Overrides loaded from `jarvisgate.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersFile {
    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,

    /// Exhaustion reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apology: Option<String>,

    /// Sanitizer fallback reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,

    /// Sampling parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingOverride>,

    /// Per-route overrides keyed by route name
    #[serde(default)]
    pub routes: HashMap<String, RouteOverride>,
}

/// Route overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteOverride {
    /// Replacement model list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    /// Replacement base URL
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Replacement credential rotation bound
    #[serde(rename = "maxKeyAttempts", skip_serializing_if = "Option::is_none")]
    pub max_key_attempts: Option<usize>,

    /// Extra headers merged over the defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Sampling overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingOverride {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

impl SamplingOverride {
    pub fn apply_to(&self, params: &mut SamplingParams) {
        if let Some(v) = self.temperature {
            params.temperature = v;
        }
        if let Some(v) = self.max_tokens {
            params.max_tokens = v;
        }
        if let Some(v) = self.top_p {
            params.top_p = v;
        }
        if let Some(v) = self.frequency_penalty {
            params.frequency_penalty = v;
        }
        if let Some(v) = self.presence_penalty {
            params.presence_penalty = v;
        }
    }
}

impl RouteOverride {
    pub fn apply_to(&self, route: &mut RouteConfig) {
        if let Some(models) = &self.models {
            route.models = models.clone();
        }
        if let Some(base_url) = &self.base_url {
            route.base_url = base_url.clone();
        }
        if let Some(attempts) = self.max_key_attempts {
            route.max_key_attempts = attempts;
        }
        for (name, value) in &self.headers {
            route.headers.insert(name.clone(), value.clone());
        }
    }
}

impl ProvidersFile {
    /// Load overrides from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading provider overrides from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read providers file: {:?}", path))?;

        let file: ProvidersFile = serde_json::from_str(&content)
            .with_context(|| "Failed to parse providers JSON")?;

        file.validate()?;

        debug!("Loaded overrides for {} routes", file.routes.len());
        Ok(file)
    }

    /// Load overrides from default locations
    /// Searches in order:
    /// 1. ~/.config/jarvisgate/providers.json
    /// 2. ./jarvisgate.json
    ///
    /// A missing file is not an error; the built-in defaults apply.
    pub fn load_default() -> Result<Option<Self>> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("jarvisgate").join("providers.json");
            if config_path.exists() {
                return Self::load(&config_path).map(Some);
            }
        }

        let local_path = Path::new("jarvisgate.json");
        if local_path.exists() {
            return Self::load(local_path).map(Some);
        }

        debug!("No provider overrides file found, using built-in defaults");
        Ok(None)
    }

    /// Validate overrides
    fn validate(&self) -> Result<()> {
        for (name, route) in &self.routes {
            if let Some(models) = &route.models {
                if models.is_empty() {
                    anyhow::bail!("Route '{}' must have at least one model", name);
                }
                if models.iter().any(|m| m.trim().is_empty()) {
                    anyhow::bail!("Route '{}' has an empty model name", name);
                }
            }

            if let Some(base_url) = &route.base_url {
                if !base_url.starts_with("http") {
                    anyhow::bail!("Invalid base URL for route '{}': {}", name, base_url);
                }
            }

            if route.max_key_attempts == Some(0) {
                anyhow::bail!("maxKeyAttempts for route '{}' cannot be 0", name);
            }
        }

        for (label, text) in [("persona", &self.persona), ("apology", &self.apology), ("greeting", &self.greeting)] {
            if matches!(text, Some(t) if t.trim().is_empty()) {
                anyhow::bail!("'{}' cannot be empty", label);
            }
        }

        Ok(())
    }
}
