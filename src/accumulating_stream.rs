//! Applies a streamed response to the session store as it arrives.
//!
//! Every text fragment is appended to the trailing message of the session
//! (and persisted) before the next fragment is awaited, so whatever has
//! been rendered is also what a reload would show.  Citations are kept
//! until the stream stops and then attached once.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::backend::{Fragment, FragmentStream};
use crate::error::Error;
use crate::observability::{ACCUMULATED_FRAGMENTS, ACCUMULATOR_CANCELLED};
use crate::render::Renderer;
use crate::store::SessionStore;
use crate::types::{Citation, SessionId};

/// How a stream stopped.
#[derive(Debug)]
pub enum StreamEnd {
    /// The backend finished the response.
    Completed,
    /// The caller cancelled before the backend finished.
    Cancelled,
    /// The backend reported an error mid-stream.
    Failed(Error),
}

impl StreamEnd {
    /// Returns true if the stream ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamEnd::Completed)
    }
}

/// The outcome of draining one fragment stream.
#[derive(Debug)]
pub struct Accumulation {
    /// Text applied, in delivery order.
    pub text: String,
    /// The citations attached when accumulation stopped.
    pub citations: Vec<Citation>,
    /// Fragments received, including empty ones.
    pub fragments: usize,
    /// Why accumulation stopped.
    pub end: StreamEnd,
}

/// Folds fragments into the trailing message of one session.
pub struct StreamingAccumulator<'a> {
    store: &'a mut SessionStore,
    session: SessionId,
    text: String,
    citations: Vec<Citation>,
    fragments: usize,
    detached: bool,
}

impl<'a> StreamingAccumulator<'a> {
    /// Accumulates into the trailing message of `session`.
    pub fn new(store: &'a mut SessionStore, session: SessionId) -> Self {
        Self {
            store,
            session,
            text: String::new(),
            citations: Vec::new(),
            fragments: 0,
            detached: false,
        }
    }

    /// Applies one fragment.
    pub fn apply(&mut self, fragment: Fragment, renderer: &mut dyn Renderer) {
        self.fragments += 1;
        ACCUMULATED_FRAGMENTS.click();
        if let Some(text) = fragment.text.filter(|t| !t.is_empty()) {
            if !self.store.grow_last_message(&self.session, &text) && !self.detached {
                tracing::debug!(session = %self.session, "session went away mid-stream");
                self.detached = true;
            }
            renderer.print_text(&text);
            self.text.push_str(&text);
        }
        if !fragment.citations.is_empty() {
            self.citations = fragment.citations;
        }
    }

    /// Attaches collected citations and reports the result.
    pub fn finish(self, end: StreamEnd, renderer: &mut dyn Renderer) -> Accumulation {
        if !self.citations.is_empty() {
            self.store
                .attach_citations(&self.session, self.citations.clone());
            renderer.print_citations(&self.citations);
        }
        match &end {
            StreamEnd::Cancelled => renderer.print_interrupted(),
            StreamEnd::Completed | StreamEnd::Failed(_) => renderer.finish_response(),
        }
        Accumulation {
            text: self.text,
            citations: self.citations,
            fragments: self.fragments,
            end,
        }
    }
}

/// Drains `stream` into `session`, stopping early on error or cancellation.
///
/// # Example
///
/// ```
/// # use futures::stream;
/// # use tokio_util::sync::CancellationToken;
/// # use gemchat::{
/// #     BufferRenderer, Fragment, FragmentStream, MemoryStorage, Message, Model, Result,
/// #     SessionStore, Timestamp, accumulate,
/// # };
/// # tokio_test::block_on(async {
/// let mut store = SessionStore::load(MemoryStorage::new());
/// let id = store.create("Hi", Model::default());
/// store.append_turn(&id, Message::user("Hi", None, Timestamp::now()));
///
/// let parts: Vec<Result<Fragment>> = vec![Ok(Fragment::text("Hel")), Ok(Fragment::text("lo"))];
/// let fragments: FragmentStream = Box::pin(stream::iter(parts));
/// let mut out = BufferRenderer::new();
/// let acc = accumulate(&mut store, &id, fragments, &CancellationToken::new(), &mut out).await;
/// assert!(acc.end.is_completed());
/// assert_eq!(store.get(&id).unwrap().last_message().unwrap().content, "Hello");
/// # });
/// ```
pub async fn accumulate(
    store: &mut SessionStore,
    session: &SessionId,
    mut stream: FragmentStream,
    cancel: &CancellationToken,
    renderer: &mut dyn Renderer,
) -> Accumulation {
    let mut accumulator = StreamingAccumulator::new(store, session.clone());
    let end = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                ACCUMULATOR_CANCELLED.click();
                break StreamEnd::Cancelled;
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(fragment)) => accumulator.apply(fragment, renderer),
            Some(Err(err)) => {
                tracing::warn!(session = %session, error = %err, "stream failed");
                break StreamEnd::Failed(err);
            }
            None => break StreamEnd::Completed,
        }
    };
    accumulator.finish(end, renderer)
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::error::Result;
    use crate::render::BufferRenderer;
    use crate::store::MemoryStorage;
    use crate::types::{Message, Model};
    use crate::utils::Timestamp;

    fn store_with_turn() -> (SessionStore, SessionId) {
        let mut store = SessionStore::load(MemoryStorage::new());
        let id = store.create("question", Model::default());
        store.append_turn(&id, Message::user("question", None, Timestamp::now()));
        (store, id)
    }

    fn fragments(items: Vec<Result<Fragment>>) -> FragmentStream {
        Box::pin(stream::iter(items))
    }

    fn answer(store: &SessionStore, id: &SessionId) -> String {
        store.get(id).unwrap().last_message().unwrap().content.clone()
    }

    #[tokio::test]
    async fn chunking_does_not_change_result() {
        let splits: [&[&str]; 4] = [
            &["Hello, world"],
            &["Hello", ", ", "world"],
            &["H", "e", "l", "l", "o", ",", " ", "w", "o", "r", "l", "d"],
            &["", "Hello, w", "", "orld", ""],
        ];
        for split in splits {
            let (mut store, id) = store_with_turn();
            let mut renderer = BufferRenderer::new();
            let items = split.iter().map(|s| Ok(Fragment::text(*s))).collect();
            let acc = accumulate(
                &mut store,
                &id,
                fragments(items),
                &CancellationToken::new(),
                &mut renderer,
            )
            .await;
            assert!(acc.end.is_completed());
            assert_eq!(acc.text, "Hello, world");
            assert_eq!(answer(&store, &id), "Hello, world");
            assert_eq!(renderer.text, "Hello, world");
            assert_eq!(acc.fragments, split.len());
        }
    }

    #[tokio::test]
    async fn failure_keeps_partial_text() {
        let (mut store, id) = store_with_turn();
        let mut renderer = BufferRenderer::new();
        let items = vec![
            Ok(Fragment::text("Par")),
            Ok(Fragment::text("tial")),
            Err(Error::service_unavailable("overloaded", None)),
            Ok(Fragment::text("never")),
        ];
        let acc = accumulate(
            &mut store,
            &id,
            fragments(items),
            &CancellationToken::new(),
            &mut renderer,
        )
        .await;
        assert!(matches!(acc.end, StreamEnd::Failed(ref e) if e.is_server_error()));
        assert_eq!(answer(&store, &id), "Partial");
        assert_eq!(renderer.finished, 1);
    }

    #[tokio::test]
    async fn cancellation_stops_application() {
        let (mut store, id) = store_with_turn();
        let mut renderer = BufferRenderer::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let items = stream::iter(vec![Ok::<_, Error>(Fragment::text("first"))])
            .inspect(move |_| trigger.cancel())
            .chain(stream::pending());
        let acc = accumulate(&mut store, &id, Box::pin(items), &cancel, &mut renderer).await;
        assert!(matches!(acc.end, StreamEnd::Cancelled));
        assert_eq!(answer(&store, &id), "first");
        assert_eq!(renderer.interrupted, 1);
        assert_eq!(renderer.finished, 0);
    }

    #[tokio::test]
    async fn last_non_empty_citations_win() {
        let (mut store, id) = store_with_turn();
        let mut renderer = BufferRenderer::new();
        let a = vec![Citation::new("A", "https://a")];
        let b = vec![Citation::new("B", "https://b")];
        let items = vec![
            Ok(Fragment::text("x").with_citations(a)),
            Ok(Fragment::citations(b.clone())),
            Ok(Fragment::text("y")),
        ];
        let acc = accumulate(
            &mut store,
            &id,
            fragments(items),
            &CancellationToken::new(),
            &mut renderer,
        )
        .await;
        assert_eq!(acc.citations, b);
        assert_eq!(store.get(&id).unwrap().last_message().unwrap().grounding_chunks, b);
        assert_eq!(renderer.citations, vec![b]);
    }

    #[tokio::test]
    async fn citations_attached_on_failure() {
        let (mut store, id) = store_with_turn();
        let mut renderer = BufferRenderer::new();
        let cited = vec![Citation::new("A", "https://a")];
        let items = vec![
            Ok(Fragment::citations(cited.clone())),
            Err(Error::abort("gone")),
        ];
        accumulate(
            &mut store,
            &id,
            fragments(items),
            &CancellationToken::new(),
            &mut renderer,
        )
        .await;
        assert_eq!(
            store.get(&id).unwrap().last_message().unwrap().grounding_chunks,
            cited
        );
    }

    #[tokio::test]
    async fn deleted_session_is_left_alone() {
        let (mut store, id) = store_with_turn();
        store.delete(&id);
        let mut renderer = BufferRenderer::new();
        let items = vec![Ok(Fragment::text("late")), Ok(Fragment::text(" reply"))];
        let acc = accumulate(
            &mut store,
            &id,
            fragments(items),
            &CancellationToken::new(),
            &mut renderer,
        )
        .await;
        assert!(acc.end.is_completed());
        assert_eq!(acc.text, "late reply");
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn empty_stream_completes() {
        let (mut store, id) = store_with_turn();
        let mut renderer = BufferRenderer::new();
        let acc = accumulate(
            &mut store,
            &id,
            fragments(Vec::new()),
            &CancellationToken::new(),
            &mut renderer,
        )
        .await;
        assert!(acc.end.is_completed());
        assert_eq!(acc.fragments, 0);
        assert_eq!(answer(&store, &id), "");
    }
}
