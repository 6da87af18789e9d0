//! Data models module
//!
//! Defines the browser-facing API payloads and the OpenAI-compatible
//! completion structures spoken by the upstream text providers

pub mod api;
pub mod completion;

pub use api::*;
pub use completion::*;
