//! Fallback cascade primitives
//!
//! A cascade is an ordered list of stages; each stage is an ordered list of
//! steps. Steps report success or a soft failure, and the first success
//! wins. Soft failures are collected rather than raised.

use crate::models::ChatMessage;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tracing::warn;

/// Why a single attempt did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Upstream answered with a non-success status
    Status { code: u16, text: String },
    /// Upstream answered 2xx but the payload had the wrong shape
    MalformedPayload(String),
    /// The request never completed (connect, timeout, body read)
    Transport(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Status { code, text } => write!(f, "HTTP {} {}", code, text),
            FailureKind::MalformedPayload(detail) => write!(f, "malformed payload: {}", detail),
            FailureKind::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

/// A per-attempt failure that moves the cascade on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
    /// Route that was attempted
    pub route: String,
    /// Model that was attempted
    pub model: String,
    /// Credential slot used, if the route rotates keys
    pub credential_slot: Option<usize>,
    pub kind: FailureKind,
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.credential_slot {
            Some(slot) => write!(f, "{} (model: {}, key #{}): {}", self.route, self.model, slot + 1, self.kind),
            None => write!(f, "{} (model: {}): {}", self.route, self.model, self.kind),
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Success(T),
    SoftFailure(SoftFailure),
}

/// Try `steps` in order with `run`, stopping at the first success
///
/// Every soft failure is logged and appended to `diagnostics`. Returns
/// `None` once the steps are exhausted.
pub async fn first_success<S, T, F, Fut>(
    steps: impl IntoIterator<Item = S>,
    mut run: F,
    diagnostics: &mut Vec<SoftFailure>,
) -> Option<T>
where
    F: FnMut(S) -> Fut,
    Fut: Future<Output = StepOutcome<T>>,
{
    for step in steps {
        match run(step).await {
            StepOutcome::Success(value) => return Some(value),
            StepOutcome::SoftFailure(failure) => {
                warn!("Attempt failed: {}", failure);
                diagnostics.push(failure);
            }
        }
    }
    None
}

/// One stage of the text cascade
#[async_trait]
pub trait CompletionStage: Send + Sync {
    /// Stage name used in reports
    fn name(&self) -> &str;

    /// Whether the stage can issue any request at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Sweep the stage's search space for a completion
    async fn complete(&self, messages: &[ChatMessage], diagnostics: &mut Vec<SoftFailure>) -> Option<String>;
}
