//! Interactive chat built on the session store and an inference backend.
//!
//! - [`config`]: command-line arguments, YAML file and resolved settings
//! - [`orchestrator`]: sending messages and managing sessions
//! - [`commands`]: slash command parsing

mod commands;
mod config;
mod orchestrator;

pub use crate::render::{BufferRenderer, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, SUGGESTIONS, SessionRef, help_text, parse_command, suggestion};
pub use config::{ChatArgs, ChatConfig, ChatFeatures, DEFAULT_SYSTEM_INSTRUCTION};
pub use orchestrator::{
    AppState, ChatOrchestrator, ChatStats, Notice, NoticeKind, SendOutcome,
};
