use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Message, Model};
use crate::utils::Timestamp;

/// Number of characters of the first message kept in a session title.
pub const TITLE_BUDGET: usize = 40;

/// Appended to titles that were cut to fit [`TITLE_BUDGET`].
pub const TITLE_ELLIPSIS: char = '…';

/// Unique identifier of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an identifier from a creation time.
    pub fn from_timestamp(timestamp: Timestamp) -> Self {
        Self(timestamp.as_millis().to_string())
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Derived from the first user message; never changes.
    pub title: String,
    /// Turns in order.
    pub messages: Vec<Message>,
    /// Model selected when the session was created.
    pub model: Model,
    /// Bumped on every append.
    pub last_updated: Timestamp,
}

impl Session {
    /// Creates an empty session titled after `first_message`.
    pub fn new(id: SessionId, first_message: &str, model: Model, now: Timestamp) -> Self {
        Self {
            id,
            title: derive_title(first_message),
            messages: Vec::new(),
            model,
            last_updated: now,
        }
    }

    /// Timestamp for the next appended message: `now`, but never earlier
    /// than the newest message already in the session.
    pub fn next_timestamp(&self, now: Timestamp) -> Timestamp {
        match self.messages.last() {
            Some(last) => now.not_before(last.timestamp),
            None => now,
        }
    }

    /// The trailing message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of user turns.
    pub fn turn_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }
}

/// Cuts `text` to [`TITLE_BUDGET`] characters, marking the cut with
/// [`TITLE_ELLIPSIS`].
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let mut title: String = chars.by_ref().take(TITLE_BUDGET).collect();
    if chars.next().is_some() {
        title.push(TITLE_ELLIPSIS);
    }
    title
}
