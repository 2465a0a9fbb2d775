//! The seam between the chat and whatever produces model responses.
//!
//! The orchestrator only ever talks to an [`InferenceBackend`].  The Gemini
//! client implements it over HTTP; tests implement it with scripted
//! fragment sequences.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;
use crate::types::{
    Citation, Content, GenerateContentRequest, GenerateContentResponse, InlineImage, MessageRole,
    Model, Part,
};

/// One incremental piece of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Text to append, if any.
    pub text: Option<String>,
    /// Citations delivered with this fragment; empty when none.
    pub citations: Vec<Citation>,
}

impl Fragment {
    /// A text-only fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            citations: Vec::new(),
        }
    }

    /// A fragment carrying only citations.
    pub fn citations(citations: Vec<Citation>) -> Self {
        Self {
            text: None,
            citations,
        }
    }

    /// Adds citations to this fragment.
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Returns true if the fragment carries nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty) && self.citations.is_empty()
    }
}

impl From<GenerateContentResponse> for Fragment {
    fn from(chunk: GenerateContentResponse) -> Self {
        Self {
            text: chunk.text(),
            citations: chunk.citations(),
        }
    }
}

/// A turn of context sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Author of the turn.
    pub role: MessageRole,
    /// Text of the turn.
    pub text: String,
    /// Inline image; only ever set on the newest user turn.
    pub image: Option<InlineImage>,
}

impl Turn {
    /// A turn without an image.
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            image: None,
        }
    }

    /// Attaches an image.
    pub fn with_image(mut self, image: Option<InlineImage>) -> Self {
        self.image = image;
        self
    }

    fn to_content(&self) -> Content {
        let mut parts = vec![Part::text(self.text.clone())];
        if let Some(image) = &self.image {
            parts.push(Part::image(image));
        }
        Content::new(self.role, parts)
    }
}

/// Everything a backend needs to produce one streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    /// Model to run.
    pub model: Model,
    /// Ordered history ending with the new user turn.
    pub turns: Vec<Turn>,
    /// Optional system instruction.
    pub system_instruction: Option<String>,
    /// Whether to enable web-search grounding.
    pub web_search: bool,
}

impl InferenceRequest {
    /// Converts to the Gemini wire format.
    pub fn to_generate_content(&self) -> GenerateContentRequest {
        let mut request =
            GenerateContentRequest::new(self.turns.iter().map(Turn::to_content).collect());
        if let Some(instruction) = &self.system_instruction {
            request = request.with_system_instruction(instruction.clone());
        }
        if self.web_search {
            request = request.with_google_search();
        }
        request
    }
}

/// A boxed stream of fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// Something that can turn a conversation into a streamed response.
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Starts a streamed response.
    ///
    /// Errors returned here happen before any fragment was produced; errors
    /// inside the stream happen part way through.
    async fn stream_generate(&self, request: InferenceRequest) -> Result<FragmentStream>;

    /// Returns false when no credential is configured, so callers can report
    /// it before attempting a request.
    fn has_credential(&self) -> bool {
        true
    }

    /// Replaces the credential.  Backends that need none ignore it.
    fn set_credential(&mut self, key: &str) {
        _ = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn fragment_from_chunk() {
        let chunk: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hi"}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://a","title":"A"}}]}}]}"#,
        )
        .unwrap();
        let fragment = Fragment::from(chunk);
        assert_eq!(fragment.text.as_deref(), Some("Hi"));
        assert_eq!(fragment.citations, vec![Citation::new("A", "https://a")]);
    }

    #[test]
    fn empty_fragments() {
        assert!(Fragment::default().is_empty());
        assert!(Fragment::text("").is_empty());
        assert!(!Fragment::text("x").is_empty());
        assert!(!Fragment::citations(vec![Citation::new("t", "u")]).is_empty());
    }

    #[test]
    fn request_to_wire() {
        let image = InlineImage::from_data_uri("data:image/png;base64,AAAA").unwrap();
        let request = InferenceRequest {
            model: Model::Known(KnownModel::Gemini3FlashPreview),
            turns: vec![
                Turn::new(MessageRole::User, "first"),
                Turn::new(MessageRole::Model, "reply"),
                Turn::new(MessageRole::User, "second").with_image(Some(image)),
            ],
            system_instruction: Some("Be brief.".to_string()),
            web_search: true,
        };
        let wire = request.to_generate_content();
        assert_eq!(wire.contents.len(), 3);
        assert_eq!(wire.contents[0].parts.len(), 1);
        assert_eq!(wire.contents[1].role, Some(MessageRole::Model));
        assert_eq!(wire.contents[2].parts.len(), 2);
        assert!(wire.contents[2].parts[1].inline_data.is_some());
        assert!(wire.system_instruction.is_some());
        assert_eq!(wire.tools.len(), 1);
    }
}
