//! Service layer module
//!
//! Contains the text fallback cascade (credential pools, routes, sanitation)
//! and the image generation client

pub mod cascade;
pub mod credentials;
pub mod image;
pub mod placeholder;
pub mod provider;
pub mod responder;
pub mod sanitizer;

pub use cascade::{first_success, CompletionStage, FailureKind, SoftFailure, StepOutcome};
pub use credentials::{Credential, CredentialPool};
pub use image::{ImageGenerator, ImageOutcome};
pub use provider::{build_http_client, ChatRoute};
pub use responder::{GenerationReport, ReplySource, Responder};
pub use sanitizer::Sanitizer;
