//! Turns user actions into store mutations and backend calls.
//!
//! [`ChatOrchestrator`] owns the session store, the backend and the small
//! amount of interface state around them (selected model, in-flight flag,
//! the current notice).  Each send runs to completion, failure or
//! cancellation before the next one may start.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::accumulating_stream::{StreamEnd, accumulate};
use crate::backend::{InferenceBackend, InferenceRequest, Turn};
use crate::chat::config::{ChatConfig, ChatFeatures};
use crate::error::Error;
use crate::observability::{SEND_DURATION, SEND_FAILURES, SEND_REJECTED, SENDS};
use crate::render::Renderer;
use crate::store::SessionStore;
use crate::types::{InlineImage, Message, MessageRole, Model, Session, SessionId};
use crate::utils::Timestamp;

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The credential is missing or was rejected.
    Credential,
    /// An attached image could not be used.
    Attachment,
    /// The backend failed before or during a response.
    Backend,
    /// Sessions could not be saved.
    Storage,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeKind::Credential => "credential",
            NoticeKind::Attachment => "attachment",
            NoticeKind::Backend => "backend",
            NoticeKind::Storage => "storage",
        };
        write!(f, "{label}")
    }
}

/// A user-visible, dismissable error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Category of the problem.
    pub kind: NoticeKind,
    /// Human-readable description.
    pub message: String,
}

impl Notice {
    /// Creates a notice.
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// How a call to [`ChatOrchestrator::send_message`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing happened: another send was in flight or the text was blank.
    Rejected,
    /// The response streamed to completion.
    Completed(SessionId),
    /// The user cancelled; text received so far was kept.
    Cancelled(SessionId),
    /// A notice was raised.  Carries the session if one was touched.
    Failed(Option<SessionId>),
}

/// Interface state shared by every operation.
pub struct AppState {
    store: SessionStore,
    current_model: Model,
    in_flight: Arc<AtomicBool>,
    notice: Option<Notice>,
    needs_credential: bool,
    search_enabled: bool,
    features: ChatFeatures,
    system_instruction: Option<String>,
}

impl AppState {
    /// The session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The model the next send will use.
    pub fn current_model(&self) -> &Model {
        &self.current_model
    }

    /// Returns true while a send is streaming.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The flag set while a send is streaming.
    pub fn in_flight_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.in_flight)
    }

    /// The current notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Returns true if the chat is waiting for a credential.
    pub fn needs_credential(&self) -> bool {
        self.needs_credential
    }

    /// Returns true if the next send will request web-search grounding.
    pub fn search_enabled(&self) -> bool {
        self.search_enabled
    }

    /// Enabled capabilities.
    pub fn features(&self) -> ChatFeatures {
        self.features
    }

    /// System instruction sent with every request.
    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }
}

/// Summary for the `/stats` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStats {
    /// Number of saved sessions.
    pub sessions: usize,
    /// Title of the active session.
    pub active_title: Option<String>,
    /// Messages in the active session.
    pub active_messages: usize,
    /// The selected model.
    pub model: Model,
    /// Whether web search is on.
    pub search_enabled: bool,
    /// Whether a credential is required.
    pub needs_credential: bool,
}

/// Clears the in-flight flag however a send ends.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Drives conversations against an [`InferenceBackend`].
pub struct ChatOrchestrator<B: InferenceBackend> {
    backend: B,
    state: AppState,
}

impl<B: InferenceBackend> ChatOrchestrator<B> {
    /// Creates an orchestrator over a loaded store.
    ///
    /// With a single session, the most recent one is selected.  With
    /// credential gating, a backend without a credential starts gated.
    pub fn new(backend: B, mut store: SessionStore, config: &ChatConfig) -> Self {
        let features = config.features;
        if !features.multi_session
            && let Some(latest) = store.sessions().first().map(|s| s.id.clone())
        {
            store.set_active(&latest);
        }
        let needs_credential = features.credential_gating && !backend.has_credential();
        let state = AppState {
            store,
            current_model: config.model.clone(),
            in_flight: Arc::new(AtomicBool::new(false)),
            notice: None,
            needs_credential,
            search_enabled: features.search,
            features,
            system_instruction: config.system_instruction.clone(),
        };
        Self { backend, state }
    }

    /// Interface state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sends `text` (and optionally an image given as a data URI) in the
    /// active session, creating one if needed, and streams the reply.
    pub async fn send_message(
        &mut self,
        text: &str,
        image: Option<&str>,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
    ) -> SendOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.state.in_flight) else {
            SEND_REJECTED.click();
            tracing::debug!("send rejected: another send is in flight");
            return SendOutcome::Rejected;
        };
        if text.trim().is_empty() {
            SEND_REJECTED.click();
            return SendOutcome::Rejected;
        }
        self.state.notice = None;

        let image = match image.map(InlineImage::from_data_uri).transpose() {
            Ok(image) => image,
            Err(err) => {
                self.raise(NoticeKind::Attachment, &err, renderer);
                return SendOutcome::Failed(None);
            }
        };
        if self.state.features.credential_gating && !self.backend.has_credential() {
            self.state.needs_credential = true;
            let err = Error::authentication("An API key is required. Use /key to connect one.");
            self.raise(NoticeKind::Credential, &err, renderer);
            return SendOutcome::Failed(None);
        }

        SENDS.click();
        let start = Instant::now();
        let session = self.ensure_session(text);
        let mut turns = self.context_for(&session);
        turns.push(Turn::new(MessageRole::User, text).with_image(image.clone()));
        self.state
            .store
            .append_turn(&session, Message::user(text, image, Timestamp::now()));

        let request = InferenceRequest {
            model: self.state.current_model.clone(),
            turns,
            system_instruction: self.state.system_instruction.clone(),
            web_search: self.state.search_enabled,
        };
        tracing::info!(
            session = %session,
            model = %request.model,
            turns = request.turns.len(),
            web_search = request.web_search,
            "sending message"
        );

        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            started = self.backend.stream_generate(request) => Some(started),
        };
        let outcome = match started {
            None => {
                renderer.print_interrupted();
                SendOutcome::Cancelled(session)
            }
            Some(Err(err)) => {
                self.fail(&err, renderer);
                SendOutcome::Failed(Some(session))
            }
            Some(Ok(stream)) => {
                let accumulation =
                    accumulate(&mut self.state.store, &session, stream, cancel, renderer).await;
                tracing::debug!(
                    session = %session,
                    fragments = accumulation.fragments,
                    chars = accumulation.text.chars().count(),
                    "stream stopped"
                );
                match accumulation.end {
                    StreamEnd::Completed => SendOutcome::Completed(session),
                    StreamEnd::Cancelled => SendOutcome::Cancelled(session),
                    StreamEnd::Failed(err) => {
                        self.fail(&err, renderer);
                        SendOutcome::Failed(Some(session))
                    }
                }
            }
        };
        SEND_DURATION.add(start.elapsed().as_secs_f64());

        if !matches!(outcome, SendOutcome::Failed(_)) {
            self.check_storage(renderer);
        } else if let Some(err) = self.state.store.take_save_error() {
            tracing::debug!(error = %err, "save failure folded into backend notice");
        }
        outcome
    }

    /// Returns the active session, creating one seeded by `text` if needed.
    fn ensure_session(&mut self, text: &str) -> SessionId {
        if let Some(id) = self.state.store.active_id() {
            return id.clone();
        }
        if !self.state.features.multi_session {
            self.state.store.clear();
        }
        self.state
            .store
            .create(text, self.state.current_model.clone())
    }

    /// Prior turns of `session` as context.  Images are never replayed and
    /// empty turns (e.g. a reply that failed before any text) are skipped.
    fn context_for(&self, session: &SessionId) -> Vec<Turn> {
        self.state
            .store
            .get(session)
            .map(|s| {
                s.messages
                    .iter()
                    .filter(|m| !m.content.is_empty())
                    .map(|m| Turn::new(m.role, m.content.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn fail(&mut self, err: &Error, renderer: &mut dyn Renderer) {
        SEND_FAILURES.click();
        if err.is_credential() {
            if self.state.features.credential_gating {
                self.state.needs_credential = true;
            }
            self.raise(NoticeKind::Credential, err, renderer);
        } else {
            self.raise(NoticeKind::Backend, err, renderer);
        }
    }

    fn raise(&mut self, kind: NoticeKind, err: &Error, renderer: &mut dyn Renderer) {
        tracing::warn!(%kind, error = %err, "raising notice");
        let notice = Notice::new(kind, err.to_string());
        renderer.print_error(&notice.to_string());
        self.state.notice = Some(notice);
    }

    fn check_storage(&mut self, renderer: &mut dyn Renderer) {
        if let Some(err) = self.state.store.take_save_error() {
            self.raise(NoticeKind::Storage, &err, renderer);
        }
    }

    /// Leaves the active session; the next send starts a new one.  With a
    /// single session, the old one is discarded.
    pub fn new_chat(&mut self, renderer: &mut dyn Renderer) {
        self.state.store.clear_active();
        if !self.state.features.multi_session {
            self.state.store.clear();
        }
        self.check_storage(renderer);
    }

    /// Makes `id` active.  Returns false for unknown ids.
    pub fn select_session(&mut self, id: &SessionId) -> bool {
        self.state.store.set_active(id)
    }

    /// Deletes a session.  Returns false for unknown ids.
    pub fn delete_session(&mut self, id: &SessionId, renderer: &mut dyn Renderer) -> bool {
        let removed = self.state.store.delete(id);
        self.check_storage(renderer);
        removed
    }

    /// Selects the model for subsequent sends and new sessions.  Recorded
    /// messages are untouched.
    pub fn set_model(&mut self, model: Model) {
        tracing::info!(%model, "model selected");
        self.state.current_model = model;
    }

    /// Turns web search on or off.  Returns false if search is unavailable.
    pub fn set_search_enabled(&mut self, enabled: bool) -> bool {
        if enabled && !self.state.features.search {
            return false;
        }
        self.state.search_enabled = enabled;
        true
    }

    /// Replaces the system instruction.
    pub fn set_system_instruction(&mut self, instruction: Option<String>) {
        self.state.system_instruction = instruction.filter(|s| !s.trim().is_empty());
    }

    /// Clears and returns the current notice.
    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.state.notice.take()
    }

    /// Supplies a credential.  Blank keys are refused.
    pub fn provide_credential(&mut self, key: &str) -> bool {
        if key.trim().is_empty() {
            return false;
        }
        self.backend.set_credential(key);
        self.state.needs_credential =
            self.state.features.credential_gating && !self.backend.has_credential();
        if !self.state.needs_credential
            && self
                .state
                .notice
                .as_ref()
                .is_some_and(|n| n.kind == NoticeKind::Credential)
        {
            self.state.notice = None;
        }
        !self.state.needs_credential
    }

    /// The active session, if any.
    pub fn active_session(&self) -> Option<&Session> {
        self.state.store.active()
    }

    /// Counts for the `/stats` command.
    pub fn stats(&self) -> ChatStats {
        let active = self.state.store.active();
        ChatStats {
            sessions: self.state.store.len(),
            active_title: active.map(|s| s.title.clone()),
            active_messages: active.map(|s| s.messages.len()).unwrap_or(0),
            model: self.state.current_model.clone(),
            search_enabled: self.state.search_enabled,
            needs_credential: self.state.needs_credential,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::stream;

    use super::*;
    use crate::backend::{Fragment, FragmentStream};
    use crate::error::Result;
    use crate::render::BufferRenderer;
    use crate::store::MemoryStorage;
    use crate::types::KnownModel;

    /// Replays one scripted response per call and records the requests.
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<Vec<Result<Vec<Result<Fragment>>>>>,
        requests: Mutex<Vec<InferenceRequest>>,
        keyless: bool,
    }

    impl Scripted {
        fn replying(responses: Vec<Result<Vec<Result<Fragment>>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<InferenceRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl InferenceBackend for Scripted {
        async fn stream_generate(&self, request: InferenceRequest) -> Result<FragmentStream> {
            self.requests.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            };
            next.map(|items| Box::pin(stream::iter(items)) as FragmentStream)
        }

        fn has_credential(&self) -> bool {
            !self.keyless
        }

        fn set_credential(&mut self, key: &str) {
            self.keyless = key.is_empty();
        }
    }

    fn orchestrator(backend: Scripted) -> ChatOrchestrator<Scripted> {
        let store = SessionStore::load(MemoryStorage::new());
        ChatOrchestrator::new(backend, store, &ChatConfig::new())
    }

    fn text(s: &str) -> Result<Fragment> {
        Ok(Fragment::text(s))
    }

    #[tokio::test]
    async fn first_message_creates_session() {
        let mut chat = orchestrator(Scripted::replying(vec![Ok(vec![text("Hi"), text("!")])]));
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        let SendOutcome::Completed(id) = outcome.clone() else {
            panic!("unexpected {outcome:?}");
        };
        let session = chat.state().store().get(&id).unwrap();
        assert_eq!(session.title, "Hello");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "Hi!");
        assert_eq!(chat.state().store().active_id(), Some(&id));
        assert!(!chat.state().is_in_flight());
        assert!(chat.state().notice().is_none());
    }

    #[tokio::test]
    async fn request_uses_current_model_and_flags() {
        let mut chat = orchestrator(Scripted::replying(vec![Ok(vec![text("a")]), Ok(vec![text("b")])]));
        let mut out = BufferRenderer::new();
        let cancel = CancellationToken::new();
        chat.send_message("one", None, &cancel, &mut out).await;
        chat.set_model(Model::Known(KnownModel::Gemini25Pro));
        assert!(chat.set_search_enabled(false));
        chat.set_system_instruction(Some("Be terse.".to_string()));
        chat.send_message("two", None, &cancel, &mut out).await;

        let requests = chat.backend().requests();
        assert_eq!(requests[0].model, Model::default());
        assert!(requests[0].web_search);
        assert_eq!(requests[1].model, Model::Known(KnownModel::Gemini25Pro));
        assert!(!requests[1].web_search);
        assert_eq!(requests[1].system_instruction.as_deref(), Some("Be terse."));
        assert_eq!(requests[1].turns.len(), 3);

        let session = chat.active_session().unwrap();
        assert_eq!(session.model, Model::default());
    }

    #[tokio::test]
    async fn in_flight_send_is_rejected() {
        let mut chat = orchestrator(Scripted::default());
        let flag = chat.state().in_flight_flag();
        flag.store(true, Ordering::SeqCst);
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        assert_eq!(outcome, SendOutcome::Rejected);
        assert!(chat.state().store().is_empty());
        assert!(chat.backend().requests().is_empty());
        assert!(chat.state().is_in_flight());
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let mut chat = orchestrator(Scripted::default());
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("   ", None, &CancellationToken::new(), &mut out)
            .await;
        assert_eq!(outcome, SendOutcome::Rejected);
        assert!(!chat.state().is_in_flight());
    }

    #[tokio::test]
    async fn bad_attachment_touches_nothing() {
        let mut chat = orchestrator(Scripted::default());
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("look", Some("not a data uri"), &CancellationToken::new(), &mut out)
            .await;
        assert_eq!(outcome, SendOutcome::Failed(None));
        assert_eq!(chat.state().notice().unwrap().kind, NoticeKind::Attachment);
        assert!(chat.state().store().is_empty());
        assert!(chat.backend().requests().is_empty());
        assert_eq!(out.errors.len(), 1);
    }

    #[tokio::test]
    async fn stream_failure_keeps_partial_answer() {
        let mut chat = orchestrator(Scripted::replying(vec![Ok(vec![
            text("Part"),
            Err(Error::service_unavailable("overloaded", None)),
        ])]));
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        assert!(matches!(outcome, SendOutcome::Failed(Some(_))));
        let session = chat.active_session().unwrap();
        assert_eq!(session.messages[1].content, "Part");
        assert_eq!(chat.state().notice().unwrap().kind, NoticeKind::Backend);
        assert_eq!(out.errors.len(), 1);
        assert!(!chat.state().is_in_flight());
    }

    #[tokio::test]
    async fn next_send_clears_previous_notice() {
        let mut chat = orchestrator(Scripted::replying(vec![
            Ok(vec![
                text("Par"),
                Err(Error::service_unavailable("overloaded", None)),
            ]),
            Ok(vec![text("fine")]),
        ]));
        let mut out = BufferRenderer::new();
        let cancel = CancellationToken::new();
        chat.send_message("first", None, &cancel, &mut out).await;
        assert_eq!(chat.state().notice().unwrap().kind, NoticeKind::Backend);

        let outcome = chat.send_message("second", None, &cancel, &mut out).await;
        assert!(matches!(outcome, SendOutcome::Completed(_)));
        assert!(chat.state().notice().is_none());
        assert_eq!(out.errors.len(), 1);
    }

    #[tokio::test]
    async fn start_failure_leaves_empty_placeholder() {
        let mut chat = orchestrator(Scripted::replying(vec![Err(Error::rate_limit("slow down", None))]));
        let mut out = BufferRenderer::new();
        chat.send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        let session = chat.active_session().unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "");
        assert_eq!(out.errors.len(), 1);
    }

    #[tokio::test]
    async fn rejected_key_gates_the_chat() {
        let mut chat = orchestrator(Scripted::replying(vec![Err(Error::authentication(
            "API key not valid",
        ))]));
        let mut out = BufferRenderer::new();
        chat.send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        assert!(chat.state().needs_credential());
        assert_eq!(chat.state().notice().unwrap().kind, NoticeKind::Credential);

        assert!(chat.provide_credential("fresh-key"));
        assert!(!chat.state().needs_credential());
        assert!(chat.state().notice().is_none());
    }

    #[tokio::test]
    async fn missing_key_blocks_send() {
        let backend = Scripted {
            keyless: true,
            ..Scripted::default()
        };
        let mut chat = orchestrator(backend);
        assert!(chat.state().needs_credential());
        let mut out = BufferRenderer::new();
        let outcome = chat
            .send_message("Hello", None, &CancellationToken::new(), &mut out)
            .await;
        assert_eq!(outcome, SendOutcome::Failed(None));
        assert!(chat.state().store().is_empty());
        assert!(!chat.provide_credential("  "));
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let mut chat = orchestrator(Scripted::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = BufferRenderer::new();
        let outcome = chat.send_message("Hello", None, &cancel, &mut out).await;
        assert!(matches!(outcome, SendOutcome::Cancelled(_)));
        assert_eq!(out.interrupted, 1);
        assert!(chat.state().notice().is_none());
    }

    #[tokio::test]
    async fn new_chat_starts_fresh_session() {
        let mut chat = orchestrator(Scripted::default());
        let mut out = BufferRenderer::new();
        let cancel = CancellationToken::new();
        chat.send_message("first", None, &cancel, &mut out).await;
        chat.new_chat(&mut out);
        assert!(chat.active_session().is_none());
        chat.send_message("second", None, &cancel, &mut out).await;
        assert_eq!(chat.state().store().len(), 2);
        assert_eq!(chat.active_session().unwrap().title, "second");
    }

    #[tokio::test]
    async fn single_session_mode() {
        let storage = MemoryStorage::new();
        let config = ChatConfig::new().with_features(ChatFeatures {
            multi_session: false,
            ..ChatFeatures::default()
        });
        let mut chat = ChatOrchestrator::new(
            Scripted::default(),
            SessionStore::load(storage.clone()),
            &config,
        );
        let mut out = BufferRenderer::new();
        let cancel = CancellationToken::new();
        chat.send_message("first", None, &cancel, &mut out).await;
        chat.new_chat(&mut out);
        chat.send_message("second", None, &cancel, &mut out).await;
        assert_eq!(chat.state().store().len(), 1);

        let reopened = ChatOrchestrator::new(Scripted::default(), SessionStore::load(storage), &config);
        assert_eq!(reopened.active_session().unwrap().title, "second");
    }

    #[tokio::test]
    async fn delete_and_select() {
        let mut chat = orchestrator(Scripted::default());
        let mut out = BufferRenderer::new();
        let cancel = CancellationToken::new();
        chat.send_message("first", None, &cancel, &mut out).await;
        let first = chat.state().store().active_id().unwrap().clone();
        chat.new_chat(&mut out);
        chat.send_message("second", None, &cancel, &mut out).await;

        assert!(chat.select_session(&first));
        assert!(chat.delete_session(&first, &mut out));
        assert!(chat.active_session().is_none());
        assert!(!chat.select_session(&first));
        assert_eq!(chat.stats().sessions, 1);
    }

    #[test]
    fn search_cannot_exceed_features() {
        let config = ChatConfig::new().with_features(ChatFeatures {
            search: false,
            ..ChatFeatures::default()
        });
        let mut chat = ChatOrchestrator::new(
            Scripted::default(),
            SessionStore::load(MemoryStorage::new()),
            &config,
        );
        assert!(!chat.state().search_enabled());
        assert!(!chat.set_search_enabled(true));
        assert!(chat.set_search_enabled(false));
    }

    #[test]
    fn dismiss_clears_notice() {
        let mut chat = orchestrator(Scripted::default());
        assert!(chat.dismiss_notice().is_none());
        chat.state.notice = Some(Notice::new(NoticeKind::Backend, "x"));
        assert_eq!(chat.dismiss_notice().unwrap().message, "x");
        assert!(chat.state().notice().is_none());
    }
}
