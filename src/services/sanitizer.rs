//! Response sanitation
//!
//! Free-tier models sometimes drift into the wrong script or emit junk
//! tokens. The sanitizer strips everything outside the allowed alphabet and
//! substitutes a fixed greeting when too little survives.

use crate::config::{SanitizerConfig, Script};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static NOT_CYRILLIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\x{0400}-\x{04FF}\x{0500}-\x{052F}\s0-9\p{P}]").expect("valid cyrillic pattern")
});

static NOT_LATIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z\x{00C0}-\x{024F}\s0-9\p{P}]").expect("valid latin pattern")
});

/// Script filter with a length floor
#[derive(Debug, Clone)]
pub struct Sanitizer {
    script: Script,
    min_length: usize,
    greeting: String,
}

impl Sanitizer {
    pub fn new(config: &SanitizerConfig) -> Self {
        Self {
            script: config.script,
            min_length: config.min_length,
            greeting: config.greeting.clone(),
        }
    }

    /// Strip disallowed characters and collapse whitespace
    pub fn clean(&self, raw: &str) -> String {
        let filtered = match self.script {
            Script::Cyrillic => NOT_CYRILLIC.replace_all(raw, ""),
            Script::Latin => NOT_LATIN.replace_all(raw, ""),
            Script::Any => raw.into(),
        };
        WHITESPACE_RUN.replace_all(&filtered, " ").trim().to_string()
    }

    /// Clean `raw`, falling back to the greeting below the length floor
    pub fn sanitize(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        if cleaned.is_empty() || cleaned.chars().count() < self.min_length {
            return self.greeting.clone();
        }
        cleaned
    }
}
