//! Logging utilities
//!
//! Helpers that keep conversations and credentials readable but short in
//! debug logs

use crate::models::{ChatMessage, ChatRole};

/// Set to true to include full message bodies in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Truncate a string with a note about original length
///
/// Counts characters, not bytes, so Cyrillic text is never split mid-char.
pub fn truncate_content(s: &str, max_len: usize) -> String {
    let total = s.chars().count();
    if total > max_len {
        let head: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", head, total - max_len)
    } else {
        s.to_string()
    }
}

/// Mask an API key for logging, keeping only the last four characters
pub fn mask_credential(secret: &str) -> String {
    let total = secret.chars().count();
    if total <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(total - 4).collect();
    format!("****{}", tail)
}

/// Create a filtered summary of a conversation for logging
pub fn conversation_log_summary(messages: &[ChatMessage]) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        return serde_json::to_value(messages).unwrap_or(serde_json::json!({"error": "serialize failed"}));
    }

    let filtered: Vec<serde_json::Value> = messages
        .iter()
        .map(|msg| {
            // System prompts are long and fixed
            let max_len = if msg.role == ChatRole::System { 60 } else { 200 };
            serde_json::json!({
                "role": msg.role,
                "content": truncate_content(&msg.content, max_len),
            })
        })
        .collect();

    serde_json::json!({
        "message_count": messages.len(),
        "messages": filtered,
    })
}
