//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use crate::config::file::ProvidersFile;
use crate::models::SamplingParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::{info, warn};

/// Name of the rotating-key OpenRouter route
pub const OPENROUTER_ROUTE: &str = "openrouter";
/// Name of the single-key Groq route
pub const GROQ_ROUTE: &str = "groq";

/// System prompt injected in front of every conversation
pub const DEFAULT_PERSONA: &str = "Ты Jarvis, AI-ассистент, который помогает пользователям разрабатывать и создавать проекты.

Правила:
- Отвечай ТОЛЬКО на русском языке
- Будь дружелюбным и профессиональным
- Помогай с программированием, дизайном и техническими вопросами
- Если не знаешь точного ответа, честно скажи об этом
- Предлагай практические решения и примеры кода

Пользователь работает в интерфейсе, похожем на v0.dev, и ждёт помощи в создании веб-приложений и интерфейсов.";

/// Returned when every text route is exhausted
pub const DEFAULT_APOLOGY: &str = "Извините, в данный момент AI-сервис недоступен. Попробуйте позже.";

/// Returned when sanitation leaves too little text
pub const DEFAULT_GREETING: &str = "Привет! Я Jarvis, ваш помощник в разработке. Как могу помочь?";

const DEFAULT_OPENROUTER_MODELS: &[&str] = &[
    "mistralai/mistral-7b-instruct:free",
    "huggingface/zephyr-7b-beta:free",
    "openchat/openchat-7b:free",
    "gryphe/mythomist-7b:free",
];

const DEFAULT_GROQ_MODELS: &[&str] = &[
    "llama3-8b-8192",
    "llama3-70b-8192",
    "mixtral-8x7b-32768",
    "gemma-7b-it",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Text generation routes and prompts
    pub text: TextConfig,
    /// Response sanitation
    pub sanitizer: SanitizerConfig,
    /// Image provider configuration
    pub image: ImageConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Routes in the order they are tried
    pub routes: Vec<RouteConfig>,
    /// System prompt
    pub persona: String,
    /// Exhaustion reply
    pub apology: String,
    /// Sampling parameters shared by all routes
    pub sampling: SamplingParams,
}

/// One OpenAI-compatible text provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route name used in logs and diagnostics
    pub name: String,
    /// API base URL (without `/chat/completions`)
    pub base_url: String,
    /// Credential pool; empty disables the route
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
    /// Models in preference order
    pub models: Vec<String>,
    /// Upper bound on credential rotations per model
    pub max_key_attempts: usize,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Send `"stream": false` explicitly
    pub disable_streaming: bool,
}

/// Script accepted by the response sanitizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Cyrillic,
    Latin,
    /// No script filtering
    Any,
}

impl FromStr for Script {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cyrillic" => Ok(Script::Cyrillic),
            "latin" => Ok(Script::Latin),
            "any" | "off" => Ok(Script::Any),
            other => anyhow::bail!("Unknown sanitizer script: {}", other),
        }
    }
}

/// Response sanitation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Allowed script
    pub script: Script,
    /// Minimum length (in chars) of an accepted reply
    pub min_length: usize,
    /// Reply used when the cleaned text is too short
    pub greeting: String,
}

/// Image provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// API key; absence is reported per request
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum inbound request size in bytes
    pub max_request_size: usize,
    /// Upstream request timeout in seconds
    pub timeout: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
    /// Whether CORS is enabled
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance
    ///
    /// Reads `.env` and the process environment, then applies the provider
    /// overrides file if one is found.
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let mut settings = Self::from_lookup(|key| std::env::var(key).ok())?;

        let overrides = match std::env::var("JARVIS_PROVIDERS_FILE") {
            Ok(path) if !path.trim().is_empty() => {
                Some(ProvidersFile::load(std::path::Path::new(path.trim()))?)
            }
            _ => ProvidersFile::load_default()?,
        };

        if let Some(file) = overrides {
            settings.apply_overrides(&file);
            settings.validate()?;
            info!("Provider overrides applied");
        }

        Ok(settings)
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let openrouter = RouteConfig {
            name: OPENROUTER_ROUTE.to_string(),
            base_url: get("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            api_keys: split_list(&get("OPENROUTER_API_KEYS", "")),
            models: DEFAULT_OPENROUTER_MODELS.iter().map(|m| m.to_string()).collect(),
            max_key_attempts: get("OPENROUTER_KEY_ATTEMPTS", "3")
                .parse()
                .context("Invalid OPENROUTER_KEY_ATTEMPTS value")?,
            headers: BTreeMap::from([
                ("HTTP-Referer".to_string(), get("OPENROUTER_REFERER", "https://localhost:3000")),
                ("X-Title".to_string(), get("OPENROUTER_TITLE", "Jarvis AI Assistant")),
            ]),
            disable_streaming: false,
        };

        let groq = RouteConfig {
            name: GROQ_ROUTE.to_string(),
            base_url: get("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
            api_keys: single_key(&get("GROQ_API_KEY", "")),
            models: DEFAULT_GROQ_MODELS.iter().map(|m| m.to_string()).collect(),
            max_key_attempts: 1,
            headers: BTreeMap::new(),
            disable_streaming: true,
        };

        let order = split_list(&get("TEXT_PROVIDER_ORDER", "openrouter,groq"));
        let routes = order_routes(&order, vec![openrouter, groq])?;

        let settings = Self {
            server: ServerConfig {
                host: get("SERVER_HOST", "0.0.0.0"),
                port: get("SERVER_PORT", "3000")
                    .parse()
                    .context("Invalid port number")?,
            },
            text: TextConfig {
                routes,
                persona: DEFAULT_PERSONA.to_string(),
                apology: DEFAULT_APOLOGY.to_string(),
                sampling: SamplingParams::default(),
            },
            sanitizer: SanitizerConfig {
                script: get("SANITIZER_SCRIPT", "cyrillic").parse()?,
                min_length: get("SANITIZER_MIN_LENGTH", "10")
                    .parse()
                    .context("Invalid SANITIZER_MIN_LENGTH value")?,
                greeting: DEFAULT_GREETING.to_string(),
            },
            image: ImageConfig {
                api_key: lookup("CLIPDROP_API_KEY")
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty()),
                base_url: get("CLIPDROP_BASE_URL", "https://clipdrop-api.co"),
            },
            request: RequestConfig {
                max_request_size: get("MAX_REQUEST_SIZE", "10485760")
                    .parse()
                    .context("Invalid maximum request size")?,
                timeout: get("REQUEST_TIMEOUT", "60")
                    .parse()
                    .context("Invalid request timeout")?,
            },
            security: SecurityConfig {
                allowed_origins: split_list(&get("ALLOWED_ORIGINS", "*")),
                cors_enabled: get("CORS_ENABLED", "true")
                    .parse()
                    .context("Invalid CORS enabled flag")?,
            },
            logging: LoggingConfig {
                level: get("RUST_LOG", "info"),
                format: get("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Apply overrides loaded from a providers file
    pub fn apply_overrides(&mut self, file: &ProvidersFile) {
        if let Some(persona) = &file.persona {
            self.text.persona = persona.clone();
        }
        if let Some(apology) = &file.apology {
            self.text.apology = apology.clone();
        }
        if let Some(greeting) = &file.greeting {
            self.sanitizer.greeting = greeting.clone();
        }
        if let Some(sampling) = &file.sampling {
            sampling.apply_to(&mut self.text.sampling);
        }

        for (name, route_override) in &file.routes {
            match self.text.routes.iter_mut().find(|r| &r.name == name) {
                Some(route) => route_override.apply_to(route),
                None => warn!("Ignoring overrides for unknown route: {}", name),
            }
        }
    }

    /// Validate configuration validity
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        for route in &self.text.routes {
            if !route.base_url.starts_with("http") {
                anyhow::bail!("Invalid base URL for route '{}', should start with 'http'", route.name);
            }
            if route.max_key_attempts == 0 {
                anyhow::bail!("Key attempts for route '{}' cannot be 0", route.name);
            }
            if route.models.is_empty() {
                anyhow::bail!("Route '{}' must have at least one model", route.name);
            }
            if route.api_keys.iter().any(|k| k.contains(char::is_whitespace)) {
                anyhow::bail!("API keys for route '{}' cannot contain whitespace", route.name);
            }
        }

        if !self.image.base_url.starts_with("http") {
            anyhow::bail!("Invalid image provider base URL, should start with 'http'");
        }

        if self.text.apology.trim().is_empty() || self.sanitizer.greeting.trim().is_empty() {
            anyhow::bail!("Apology and greeting texts cannot be empty");
        }

        if self.request.timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        // Directive strings such as "jarvisgate=debug" are passed through
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !self.logging.level.contains('=') && !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Look up a text route by name
    pub fn route(&self, name: &str) -> Option<&RouteConfig> {
        self.text.routes.iter().find(|r| r.name == name)
    }

    /// Whether any text route has at least one credential
    pub fn has_text_credentials(&self) -> bool {
        self.text.routes.iter().any(|r| !r.api_keys.is_empty())
    }
}

/// Split a comma-separated list, dropping blank entries
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// A single fixed credential; commas are part of the key, not separators
fn single_key(raw: &str) -> Vec<String> {
    let key = raw.trim();
    if key.is_empty() {
        Vec::new()
    } else {
        vec![key.to_string()]
    }
}

/// Arrange routes in the configured order
fn order_routes(order: &[String], mut available: Vec<RouteConfig>) -> Result<Vec<RouteConfig>> {
    if order.is_empty() {
        anyhow::bail!("TEXT_PROVIDER_ORDER must name at least one route");
    }

    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(order.len());

    for name in order {
        let name = name.to_lowercase();
        if !seen.insert(name.clone()) {
            anyhow::bail!("Route '{}' listed twice in TEXT_PROVIDER_ORDER", name);
        }
        let index = available
            .iter()
            .position(|r| r.name == name)
            .with_context(|| format!("Unknown text route: {}", name))?;
        ordered.push(available.remove(index));
    }

    Ok(ordered)
}
