use serde::{Deserialize, Serialize};

use crate::types::{Citation, Content};

/// A web or maps source found by the search tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    /// Address of the source.
    #[serde(default)]
    pub uri: String,
    /// Title of the source.
    #[serde(default)]
    pub title: String,
}

/// One grounding entry; the API tags the kind by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// A web page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<GroundingSource>,
    /// A maps place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<GroundingSource>,
}

impl GroundingChunk {
    /// Flattens this entry into a [`Citation`], if it names a source.
    pub fn to_citation(&self) -> Option<Citation> {
        self.web
            .as_ref()
            .or(self.maps.as_ref())
            .filter(|source| !source.uri.is_empty())
            .map(|source| Citation::new(source.title.clone(), source.uri.clone()))
    }
}

/// Search grounding attached to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Sources backing the answer.
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    /// Queries the tool issued.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

/// One candidate answer in a response chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content generated so far in this chunk.
    #[serde(default)]
    pub content: Option<Content>,
    /// Set on the final chunk, e.g. `STOP` or `MAX_TOKENS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Search grounding, when the search tool was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
    /// Position among the candidates.
    #[serde(default)]
    pub index: u32,
}

/// Feedback on the prompt, present when it was blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Why the prompt was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// One chunk of a `streamGenerateContent` response (or the whole response of
/// a non-streaming call).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate answers; the chat only looks at the first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Set when the prompt was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Model that actually served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate in this chunk, if non-empty.
    pub fn text(&self) -> Option<String> {
        let text = self.candidates.first()?.content.as_ref()?.text();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Citations of the first candidate in this chunk.
    pub fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|g| {
                g.grounding_chunks
                    .iter()
                    .filter_map(GroundingChunk::to_citation)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate, if this is the final chunk.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }

    /// Block reason, if the prompt was refused outright.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_chunk() {
        let chunk: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"},"index":0}],"modelVersion":"gemini-3-flash-preview"}"#,
        )
        .unwrap();
        assert_eq!(chunk.text().as_deref(), Some("Hel"));
        assert!(chunk.citations().is_empty());
        assert!(chunk.finish_reason().is_none());
    }

    #[test]
    fn parse_final_chunk_with_grounding() {
        let chunk: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "lo"}], "role": "model"},
                    "finishReason": "STOP",
                    "groundingMetadata": {
                        "webSearchQueries": ["rust"],
                        "groundingChunks": [
                            {"web": {"uri": "https://www.rust-lang.org", "title": "rust-lang.org"}},
                            {"maps": {"uri": "https://maps.example/p", "title": "Place"}},
                            {}
                        ]
                    }
                }],
                "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
            }"#,
        )
        .unwrap();
        assert_eq!(chunk.finish_reason(), Some("STOP"));
        assert_eq!(
            chunk.citations(),
            vec![
                Citation::new("rust-lang.org", "https://www.rust-lang.org"),
                Citation::new("Place", "https://maps.example/p"),
            ]
        );
    }

    #[test]
    fn empty_chunk_has_no_text() {
        let chunk: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(chunk.text().is_none());
        let chunk: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(chunk.block_reason(), Some("SAFETY"));
    }
}
