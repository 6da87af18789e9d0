//! Browser-facing API models
//!
//! Payloads exchanged with the chat UI. Field names follow the UI's
//! camelCase convention.

use super::completion::ChatMessage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One transcript entry as the UI stores it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// Message text (missing text becomes empty content)
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the user wrote this entry; only a literal `true` counts
    #[serde(default, deserialize_with = "strict_true")]
    pub is_user: bool,
}

/// Accept any JSON value, treating everything but `true` as false
fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Option::<Value>::deserialize(deserializer)?, Some(Value::Bool(true))))
}

impl From<ChatTurn> for ChatMessage {
    fn from(turn: ChatTurn) -> Self {
        let content = turn.text.unwrap_or_default();
        if turn.is_user {
            ChatMessage::user(content)
        } else {
            ChatMessage::assistant(content)
        }
    }
}

/// POST /api/chat request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Convert the UI transcript into role-tagged messages
    pub fn into_conversation(self) -> Vec<ChatMessage> {
        self.messages.into_iter().map(ChatMessage::from).collect()
    }
}

/// POST /api/chat success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// POST /api/generate-image request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// POST /api/generate-image 200 bodies
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImageReply {
    /// The provider produced an image
    Generated {
        success: bool,
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
    /// The provider is out of credits; a placeholder is attached
    Fallback {
        error: String,
        fallback: bool,
        #[serde(rename = "mockImageUrl")]
        mock_image_url: String,
    },
}

/// GET /api/test-ai body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestReply {
    pub success: bool,
    pub response: String,
    pub message: String,
}
