//! Configuration management module
//!
//! Loads settings from environment variables (and `.env`), then applies
//! optional provider overrides from a JSON file.

pub mod file;
pub mod settings;

pub use file::{ProvidersFile, RouteOverride, SamplingOverride};
pub use settings::{
    ImageConfig, LoggingConfig, RequestConfig, RouteConfig, SanitizerConfig, Script,
    SecurityConfig, ServerConfig, Settings, TextConfig,
};
