// Public modules
pub mod accumulating_stream;
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use accumulating_stream::{Accumulation, StreamEnd, StreamingAccumulator, accumulate};
pub use backend::{Fragment, FragmentStream, InferenceBackend, InferenceRequest, Turn};
pub use client::{API_KEY_ENV_VARS, Gemini};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{BufferRenderer, PlainTextRenderer, Renderer};
pub use store::{FileStorage, MemoryStorage, STORAGE_KEY, SessionStore, Storage};
pub use types::*;
pub use utils::Timestamp;
