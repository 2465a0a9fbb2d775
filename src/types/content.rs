use serde::{Deserialize, Serialize};

use crate::types::{InlineImage, MessageRole};

/// Raw bytes with a MIME type, as the API expects for inline media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

impl From<&InlineImage> for Blob {
    fn from(image: &InlineImage) -> Self {
        Self {
            mime_type: image.mime_type().to_string(),
            data: image.data().to_string(),
        }
    }
}

/// One piece of a [`Content`].
///
/// The API distinguishes parts by which field is present, so every field is
/// optional and at most one is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Inline media part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,

    /// Set on parts that carry model reasoning rather than answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// An inline image part.
    pub fn image(image: &InlineImage) -> Self {
        Self {
            inline_data: Some(Blob::from(image)),
            ..Self::default()
        }
    }

    /// Returns true for reasoning parts.
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

/// A role-tagged list of parts: one turn on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Author of the turn; omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// The parts, in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Creates a turn with the given role and parts.
    pub fn new(role: MessageRole, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role),
            parts,
        }
    }

    /// Creates a role-less single-text content, as used for system
    /// instructions.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenates all non-thought text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| !p.is_thought())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_user_turn_with_image() {
        let image = InlineImage::from_data_uri("data:image/png;base64,AAAA").unwrap();
        let content = Content::new(
            MessageRole::User,
            vec![Part::text("what is this?"), Part::image(&image)],
        );
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "parts": [
                    {"text": "what is this?"},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                ],
            })
        );
    }

    #[test]
    fn instruction_has_no_role() {
        let json = serde_json::to_value(Content::instruction("Be brief.")).unwrap();
        assert_eq!(json, serde_json::json!({"parts": [{"text": "Be brief."}]}));
    }

    #[test]
    fn text_skips_thoughts() {
        let content: Content = serde_json::from_str(
            r#"{"role":"model","parts":[{"text":"hmm","thought":true},{"text":"Hi"},{"text":" there"}]}"#,
        )
        .unwrap();
        assert_eq!(content.text(), "Hi there");
    }
}
