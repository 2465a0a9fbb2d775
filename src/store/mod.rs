//! The session store: every conversation, persisted after every change.
//!
//! The store owns the full list of sessions (most recent first) and the
//! transient "active" pointer.  Each mutating call writes the whole list
//! back to [`Storage`] before returning, so a crash between two calls never
//! loses an applied change.  Persistence failures do not roll back memory;
//! they are logged and kept for the caller to collect with
//! [`SessionStore::take_save_error`].

mod storage;

pub use storage::{FileStorage, MemoryStorage, Storage};

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::observability::{STORE_LOAD_DISCARDS, STORE_SAVE_ERRORS, STORE_SAVES};
use crate::types::{Citation, Message, Model, Session, SessionId};
use crate::utils::Timestamp;

/// Key the session list is stored under.
pub const STORAGE_KEY: &str = "gemini_sessions";

/// All sessions plus the active pointer.
pub struct SessionStore {
    storage: Box<dyn Storage>,
    sessions: Vec<Session>,
    active: Option<SessionId>,
    save_error: Option<Error>,
}

impl SessionStore {
    /// Loads the persisted session list.
    ///
    /// Absent or unreadable state yields an empty store; the problem is
    /// logged, never returned.
    pub fn load<S: Storage + 'static>(storage: S) -> Self {
        let sessions = match storage.read(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Session>>(&raw) {
                Ok(sessions) => dedup_ids(sessions),
                Err(err) => {
                    STORE_LOAD_DISCARDS.click();
                    tracing::warn!(error = %err, "discarding malformed session state");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                STORE_LOAD_DISCARDS.click();
                tracing::warn!(error = %err, "could not read session state");
                Vec::new()
            }
        };
        tracing::debug!(sessions = sessions.len(), "loaded sessions");
        Self {
            storage: Box::new(storage),
            sessions,
            active: None,
            save_error: None,
        }
    }

    /// Writes the whole session list to storage.
    pub fn save(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.sessions)?;
        self.storage.write(STORAGE_KEY, &raw)?;
        STORE_SAVES.click();
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(err) = self.save() {
            STORE_SAVE_ERRORS.click();
            tracing::error!(error = %err, "failed to persist sessions");
            self.save_error = Some(err);
        }
    }

    /// Returns and clears the most recent persistence failure.
    pub fn take_save_error(&mut self) -> Option<Error> {
        self.save_error.take()
    }

    /// Sessions, most recent first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Looks a session up by id.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    /// The active session id, if any.
    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    /// The active session, if any.
    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Makes `id` the active session.  Returns false for unknown ids.
    pub fn set_active(&mut self, id: &SessionId) -> bool {
        if self.get(id).is_some() {
            self.active = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Clears the active pointer.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Creates a session titled after `first_message`, puts it first and
    /// makes it active.
    pub fn create(&mut self, first_message: &str, model: Model) -> SessionId {
        let now = Timestamp::now();
        let mut millis = now.as_millis();
        let existing: HashSet<&SessionId> = self.sessions.iter().map(|s| &s.id).collect();
        let mut id = SessionId::from_timestamp(Timestamp::from_millis(millis));
        while existing.contains(&id) {
            millis += 1;
            id = SessionId::from_timestamp(Timestamp::from_millis(millis));
        }

        let session = Session::new(id.clone(), first_message, model, now);
        tracing::info!(session = %id, title = %session.title, "created session");
        self.sessions.insert(0, session);
        self.active = Some(id.clone());
        self.persist();
        id
    }

    /// Removes a session.  Clears the active pointer if it pointed there.
    /// Returns false if no such session existed.
    pub fn delete(&mut self, id: &SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| &s.id != id);
        let removed = self.sessions.len() != before;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        if removed {
            tracing::info!(session = %id, "deleted session");
            self.persist();
        }
        removed
    }

    /// Removes every session.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.active = None;
        self.persist();
    }

    /// Appends `user_message` and an empty model placeholder.
    ///
    /// Timestamps are clamped so they never run backwards within the
    /// session.  Returns false if the session does not exist.
    pub fn append_turn(&mut self, id: &SessionId, mut user_message: Message) -> bool {
        let Some(session) = self.get_mut(id) else {
            return false;
        };
        user_message.timestamp = session.next_timestamp(user_message.timestamp);
        let placeholder_at = user_message.timestamp.not_before(Timestamp::now());
        session.messages.push(user_message);
        session.messages.push(Message::placeholder(placeholder_at));
        session.last_updated = placeholder_at;
        self.persist();
        true
    }

    /// Appends `delta` to the trailing message of a session.
    ///
    /// Returns false, changing nothing, if the session is gone (e.g. it was
    /// deleted while its response was streaming) or has no messages.
    pub fn grow_last_message(&mut self, id: &SessionId, delta: &str) -> bool {
        let Some(last) = self.get_mut(id).and_then(|s| s.messages.last_mut()) else {
            return false;
        };
        if delta.is_empty() {
            return true;
        }
        last.content.push_str(delta);
        self.persist();
        true
    }

    /// Replaces the citations on the trailing message of a session.
    pub fn attach_citations(&mut self, id: &SessionId, citations: Vec<Citation>) -> bool {
        let Some(last) = self.get_mut(id).and_then(|s| s.messages.last_mut()) else {
            return false;
        };
        last.grounding_chunks = citations;
        self.persist();
        true
    }
}

fn dedup_ids(sessions: Vec<Session>) -> Vec<Session> {
    let mut seen = HashSet::new();
    let total = sessions.len();
    let kept: Vec<Session> = sessions
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect();
    if kept.len() != total {
        tracing::warn!(dropped = total - kept.len(), "dropped sessions with duplicate ids");
    }
    kept
}
