use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::InlineImage;
use crate::utils::Timestamp;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the person at the keyboard.
    User,
    /// Produced by the model.
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

/// A web reference backing part of a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Page title as reported by the search tool.
    pub title: String,
    /// Address of the cited page.
    pub uri: String,
}

impl Citation {
    /// Creates a new citation.
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// One turn in a conversation.
///
/// Only the trailing model message of a session is ever mutated, and only
/// while its response is streaming in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Author of the turn.
    pub role: MessageRole,

    /// Text of the turn.
    pub content: String,

    /// Optional inline image, user turns only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,

    /// Creation time.
    pub timestamp: Timestamp,

    /// Web citations gathered while the response streamed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_chunks: Vec<Citation>,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>, image: Option<InlineImage>, timestamp: Timestamp) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            image,
            timestamp,
            grounding_chunks: Vec::new(),
        }
    }

    /// Creates an empty model message to be grown by a streaming response.
    pub fn placeholder(timestamp: Timestamp) -> Self {
        Self {
            role: MessageRole::Model,
            content: String::new(),
            image: None,
            timestamp,
            grounding_chunks: Vec::new(),
        }
    }

    /// Returns true for user-authored messages.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Returns true for model-authored messages.
    pub fn is_model(&self) -> bool {
        self.role == MessageRole::Model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape() {
        let mut msg = Message::placeholder(Timestamp::from_millis(42));
        msg.content = "hi".to_string();
        msg.grounding_chunks
            .push(Citation::new("Example", "https://example.com"));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "model",
                "content": "hi",
                "timestamp": 42,
                "groundingChunks": [{"title": "Example", "uri": "https://example.com"}],
            })
        );
    }

    #[test]
    fn optional_fields_default() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"user","content":"yo","timestamp":7}"#).unwrap();
        assert!(msg.is_user());
        assert!(msg.image.is_none());
        assert!(msg.grounding_chunks.is_empty());
    }

    #[test]
    fn user_message_keeps_image() {
        let image = InlineImage::from_data_uri("data:image/gif;base64,R0lG").unwrap();
        let msg = Message::user("look", Some(image.clone()), Timestamp::from_millis(1));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""image":"data:image/gif;base64,R0lG""#));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.image, Some(image));
    }
}
