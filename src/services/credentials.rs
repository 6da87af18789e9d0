//! Credential pool
//!
//! Round-robin rotation over the API keys of one provider route.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A credential picked from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential<'a> {
    /// Position of the key in the configured list
    pub slot: usize,
    /// The key itself
    pub secret: &'a str,
}

/// Ordered API keys plus a shared rotation cursor
///
/// The cursor advances on every pick, whatever the outcome of the request
/// made with the key, so concurrent requests spread across the pool.
#[derive(Debug, Default)]
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Create a pool; an empty list yields a disabled pool
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pick the next credential and advance the cursor
    pub fn next_credential(&self) -> Option<Credential<'_>> {
        let len = self.keys.len();
        if len == 0 {
            return None;
        }

        // fetch_update only fails when the closure returns None
        let slot = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| Some((current + 1) % len))
            .unwrap_or_else(|current| current)
            % len;

        Some(Credential {
            slot,
            secret: &self.keys[slot],
        })
    }

    /// Number of credential rotations to try per model
    pub fn attempts_per_model(&self, max_attempts: usize) -> usize {
        max_attempts.min(self.keys.len())
    }
}
