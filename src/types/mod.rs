// Public modules
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod inline_image;
pub mod message;
pub mod model;
pub mod session;

// Re-exports
pub use content::{Blob, Content, Part};
pub use generate_content_request::{GenerateContentRequest, GoogleSearch, Tool};
pub use generate_content_response::{
    Candidate, GenerateContentResponse, GroundingChunk, GroundingMetadata, GroundingSource,
    PromptFeedback,
};
pub use inline_image::InlineImage;
pub use message::{Citation, Message, MessageRole};
pub use model::{KnownModel, Model};
pub use session::{Session, SessionId, TITLE_BUDGET, TITLE_ELLIPSIS, derive_title};
