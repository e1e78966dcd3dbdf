//! Review stream sessions.
//!
//! A session opens one review stream and runs it to the end:
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Closed
//!   \________\______________\______^  (cancel, setup failure)
//! ```
//!
//! Two bindings share the same pipeline. [`ApiClient::stream_review`] runs
//! the session on a spawned task and calls back into the caller;
//! [`ApiClient::review_events`] hands the caller a [`futures::Stream`] to
//! pull from. Both come with a cancel handle that may be used any number of
//! times, from any thread.

use crate::client::{transport_error, ApiClient};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use reqwest::header::ACCEPT;
use reqwest::Method;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use vos_review_core::{ApiError, ApiResult, ReviewEvent, ReviewStreamRequest};
use vos_review_streaming::{
    drive, CallbackSink, CancelGate, ChunkReader, Dispatcher, EventSink, EventStream, StreamReport,
};

/// Detail used when a stream could not be opened and the body says nothing.
pub const STREAM_SETUP_FALLBACK: &str = "Failed to start review";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, request not sent yet.
    Idle,
    /// Request sent, waiting for the response.
    Connecting,
    /// Reading events.
    Streaming,
    /// Finished, failed or cancelled. Terminal.
    Closed,
}

impl SessionState {
    /// Check if the session has ended.
    #[must_use]
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<Mutex<SessionState>>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(SessionState::Idle)))
    }

    fn get(&self) -> SessionState {
        *self.0.lock()
    }

    /// Move forward to `next`. Fails once the session is closed.
    fn advance(&self, next: SessionState) -> bool {
        let mut state = self.0.lock();
        if state.is_closed() {
            return false;
        }
        *state = next;
        true
    }

    /// Close the session. Returns `false` if it was already closed.
    fn close(&self) -> bool {
        let mut state = self.0.lock();
        let was_open = !state.is_closed();
        *state = SessionState::Closed;
        was_open
    }
}

/// Cancels a session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    gate: CancelGate,
    state: SharedState,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            gate: CancelGate::new(),
            state: SharedState::new(),
        }
    }

    /// Stop the session.
    ///
    /// The session is `Closed` when this returns. A callback running on
    /// another thread is waited for and no callback starts afterwards; a
    /// pending read is abandoned. Calling it again, or after the session
    /// ended on its own, does nothing. Callbacks may call it too.
    pub fn cancel(&self) {
        self.gate.cancel();
        if self.state.close() {
            tracing::debug!("Review stream cancelled");
        }
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }
}

/// A running callback-style session.
///
/// Dropping the handle does not stop the session; use
/// [`StreamHandle::cancel`] for that.
#[derive(Debug)]
pub struct StreamHandle {
    cancel: CancelHandle,
    task: JoinHandle<StreamReport>,
}

impl StreamHandle {
    /// Stop the session. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clonable handle that can cancel the session from elsewhere.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.cancel.state()
    }

    /// Check if the session task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    ///
    /// A panic raised by a callback is resumed here.
    pub async fn finished(self) -> StreamReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => StreamReport::cancelled(),
        }
    }
}

/// A pull-style session: a stream of events plus its cancel handle.
///
/// Normal events come through as `Ok`, in-stream `error` events as `Err`. A
/// transport or decode failure yields one final `Err`. The stream ends when
/// the body ends or the session is cancelled.
pub struct ReviewEvents {
    inner: Pin<Box<dyn Stream<Item = Result<ReviewEvent, ApiError>> + Send>>,
    cancel: CancelHandle,
}

impl fmt::Debug for ReviewEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewEvents")
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl ReviewEvents {
    /// Stop the session. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clonable handle that can cancel the session from elsewhere.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.cancel.state()
    }
}

impl Stream for ReviewEvents {
    type Item = Result<ReviewEvent, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            self.cancel.state.close();
            return Poll::Ready(None);
        }

        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None) = polled {
            if self.cancel.state.close() {
                tracing::debug!("Review stream closed");
            }
        }
        polled
    }
}

impl ApiClient {
    /// Stream a review, delivering events and errors to two callbacks.
    ///
    /// `on_event` receives every event except `error` events, in arrival
    /// order. `on_error` receives in-stream `error` events and at most one
    /// terminal failure (setup, transport or decode). Neither is called once
    /// the session is closed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stream_review<I, S, E, F>(
        &self,
        document_id: &str,
        persona_ids: I,
        on_event: E,
        on_error: F,
    ) -> StreamHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: FnMut(ReviewEvent) + Send + 'static,
        F: FnMut(ApiError) + Send + 'static,
    {
        self.stream_review_with(document_id, persona_ids, CallbackSink::new(on_event, on_error))
    }

    /// Stream a review into any [`EventSink`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stream_review_with<I, S, K>(
        &self,
        document_id: &str,
        persona_ids: I,
        sink: K,
    ) -> StreamHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        K: EventSink + 'static,
    {
        let request = ReviewStreamRequest::new(persona_ids);
        let cancel = CancelHandle::new();
        let task = tokio::spawn(run_session(
            self.clone(),
            document_id.to_string(),
            request,
            sink,
            cancel.clone(),
        ));
        StreamHandle { cancel, task }
    }

    /// Open a review stream and return it as a pull-style stream.
    ///
    /// Resolves once the response headers arrived. A failure to open the
    /// stream is returned here and never appears in the stream itself.
    pub async fn review_events<I, S>(
        &self,
        document_id: &str,
        persona_ids: I,
    ) -> ApiResult<ReviewEvents>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = ReviewStreamRequest::new(persona_ids);
        let cancel = CancelHandle::new();
        cancel.state.advance(SessionState::Connecting);

        let response = match self.open_stream(document_id, &request).await {
            Ok(response) => response,
            Err(err) => {
                cancel.state.close();
                return Err(err);
            }
        };
        let status = response.status().as_u16();
        if status == 204 {
            cancel.state.close();
            return Err(ApiError::missing_body(Some(status)));
        }

        cancel.state.advance(SessionState::Streaming);
        let events = EventStream::new(Box::pin(response.bytes_stream()))
            .take_until(cancel.gate.token().clone().cancelled_owned());

        Ok(ReviewEvents {
            inner: Box::pin(events),
            cancel,
        })
    }

    /// Send the stream request and check its status.
    async fn open_stream(
        &self,
        document_id: &str,
        request: &ReviewStreamRequest,
    ) -> ApiResult<reqwest::Response> {
        let response = self
            .request(Method::POST, &["reviews", document_id, "review", "stream"])?
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body is treated like an empty one.
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::from_body(status.as_u16(), &body, STREAM_SETUP_FALLBACK));
        }
        Ok(response)
    }
}

async fn run_session<K: EventSink>(
    client: ApiClient,
    document_id: String,
    request: ReviewStreamRequest,
    sink: K,
    cancel: CancelHandle,
) -> StreamReport {
    let mut dispatcher = Dispatcher::new(sink, cancel.gate.clone());

    if !cancel.state.advance(SessionState::Connecting) {
        return StreamReport::cancelled();
    }
    tracing::debug!(
        document_id = %document_id,
        personas = request.persona_ids.len(),
        "Opening review stream"
    );

    let opened = tokio::select! {
        biased;
        () = cancel.gate.token().cancelled() => None,
        result = client.open_stream(&document_id, &request) => Some(result),
    };

    let report = match opened {
        None => StreamReport::cancelled(),
        Some(Err(err)) => setup_failed(&mut dispatcher, err),
        Some(Ok(response)) => {
            let status = response.status().as_u16();
            tracing::info!(document_id = %document_id, status, "Review stream open");
            let body = (status != 204).then(|| Box::pin(response.bytes_stream()));
            stream_body(body, status, &mut dispatcher, &cancel).await
        }
    };

    dispatcher.close();
    cancel.state.close();
    report
}

/// Run an opened stream body through the pipeline.
async fn stream_body<B, E, K>(
    body: Option<B>,
    status: u16,
    dispatcher: &mut Dispatcher<K>,
    cancel: &CancelHandle,
) -> StreamReport
where
    B: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
    K: EventSink,
{
    let reader = match ChunkReader::open(body, cancel.gate.token().clone()) {
        Ok(reader) => reader,
        Err(err) => return setup_failed(dispatcher, err.into_api_error(Some(status))),
    };

    if !cancel.state.advance(SessionState::Streaming) {
        return StreamReport::cancelled();
    }

    let report = drive(reader, dispatcher).await;
    cancel.state.close();
    report
}

fn setup_failed<K: EventSink>(dispatcher: &mut Dispatcher<K>, error: ApiError) -> StreamReport {
    if dispatcher.fail(error.clone()) {
        tracing::warn!(
            status = ?error.status,
            code = %error.code,
            detail = %error.detail,
            "Failed to open review stream"
        );
        StreamReport::setup_failed(error)
    } else {
        StreamReport::cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, CSRF_HEADER};
    use futures::stream::{self, BoxStream};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use vos_review_core::PersonaStatus;
    use vos_review_streaming::{ChannelSink, StreamOutcome};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STATUS_LINE: &str = r##"data: {"type":"status","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","status":"running"}"##;
    const COMMENT_LINE: &str = r##"data: {"type":"comment","comment":{"id":"c1","content":"issue","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","anchor":{"file_path":"doc.md","start_line":3,"end_line":3},"created_at":"2024-01-01T00:00:00Z"}}"##;
    const ERROR_LINE: &str = r#"data: {"type":"error","error":"llm_timeout","detail":"Persona p2 timed out"}"#;
    const COMPLETE_LINE: &str = r#"data: {"type":"complete","review_id":"r1","total_comments":1}"#;

    type Items = mpsc::UnboundedReceiver<Result<ReviewEvent, ApiError>>;

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(ClientConfig::new().with_base_url(server.uri())).unwrap()
    }

    fn sse(lines: &[&str]) -> ResponseTemplate {
        let mut body = lines.join("\n");
        body.push('\n');
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/event-stream")
            .set_body_string(body)
    }

    async fn mount_stream(server: &MockServer, doc: &str, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/reviews/{doc}/review/stream")))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn drain(rx: &mut Items) -> Vec<Result<ReviewEvent, ApiError>> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_stream_review_delivers_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/reviews/d1/review/stream"))
            .and(header("accept", "text/event-stream"))
            .and(header(CSRF_HEADER, "tok"))
            .and(body_json(json!({"persona_ids": ["p1", "p2"]})))
            .respond_with(sse(&[
                ": keep-alive",
                STATUS_LINE,
                "data: {broken",
                COMMENT_LINE,
                ERROR_LINE,
                COMPLETE_LINE,
            ]))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new()
                .with_base_url(server.uri())
                .with_csrf_token("tok"),
        )
        .unwrap();

        let (sink, mut rx) = ChannelSink::channel();
        let handle = client.stream_review_with("d1", ["p1", "p2"], sink);
        let report = handle.finished().await;

        assert_eq!(report.outcome, StreamOutcome::Completed);
        assert_eq!(report.stats.skipped_lines, 1);
        assert_eq!(report.stats.ignored_lines, 1);

        let items = drain(&mut rx);
        assert_eq!(items.len(), 4);
        assert!(matches!(
            &items[0],
            Ok(ReviewEvent::Status { status: PersonaStatus::Running, .. })
        ));
        assert!(matches!(&items[1], Ok(ReviewEvent::Comment { comment }) if comment.id == "c1"));
        let err = items[2].as_ref().unwrap_err();
        assert_eq!(err.code, "llm_timeout");
        assert_eq!(err.status, None);
        assert!(matches!(&items[3], Ok(event) if event.is_terminal()));
    }

    #[tokio::test]
    async fn test_stream_review_with_callbacks() {
        let server = MockServer::start().await;
        mount_stream(&server, "d1", sse(&[STATUS_LINE, ERROR_LINE, COMPLETE_LINE])).await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (ev, er) = (events.clone(), errors.clone());

        let handle = client_for(&server).stream_review(
            "d1",
            vec!["p1".to_string()],
            move |event| ev.lock().push(event.kind()),
            move |error| er.lock().push(error.code),
        );
        let report = handle.finished().await;

        assert!(report.outcome.is_success());
        assert_eq!(*events.lock(), vec!["status", "complete"]);
        assert_eq!(*errors.lock(), vec!["llm_timeout".to_string()]);
    }

    #[tokio::test]
    async fn test_setup_failure_reports_once() {
        let server = MockServer::start().await;
        mount_stream(
            &server,
            "missing",
            ResponseTemplate::new(404).set_body_json(json!({
                "error": "not_found",
                "detail": "doc missing"
            })),
        )
        .await;

        let (sink, mut rx) = ChannelSink::channel();
        let handle = client_for(&server).stream_review_with("missing", ["p1"], sink);
        let cancel = handle.cancel_handle();
        let report = handle.finished().await;

        let expected = ApiError::new(Some(404), "not_found", "doc missing");
        assert_eq!(report.outcome, StreamOutcome::Failed(expected.clone()));
        assert_eq!(drain(&mut rx), vec![Err(expected)]);
        assert_eq!(cancel.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_setup_failure_with_non_json_body() {
        let server = MockServer::start().await;
        mount_stream(
            &server,
            "d1",
            ResponseTemplate::new(500).set_body_string("Internal Server Error"),
        )
        .await;

        let (sink, mut rx) = ChannelSink::channel();
        let report = client_for(&server)
            .stream_review_with("d1", ["p1"], sink)
            .finished()
            .await;

        let expected = ApiError::new(Some(500), ApiError::UNKNOWN, STREAM_SETUP_FALLBACK);
        assert_eq!(report.outcome.error(), Some(&expected));
        assert_eq!(drain(&mut rx), vec![Err(expected)]);
    }

    #[tokio::test]
    async fn test_no_content_is_missing_body() {
        let server = MockServer::start().await;
        mount_stream(&server, "d1", ResponseTemplate::new(204)).await;

        let (sink, mut rx) = ChannelSink::channel();
        let report = client_for(&server)
            .stream_review_with("d1", ["p1"], sink)
            .finished()
            .await;

        assert_eq!(report.outcome.error().unwrap().code, ApiError::MISSING_BODY);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_connecting() {
        let server = MockServer::start().await;
        mount_stream(
            &server,
            "d1",
            sse(&[STATUS_LINE]).set_delay(Duration::from_secs(30)),
        )
        .await;

        let (sink, mut rx) = ChannelSink::channel();
        let handle = client_for(&server).stream_review_with("d1", ["p1"], sink);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.state(), SessionState::Connecting);

        handle.cancel();
        assert_eq!(handle.state(), SessionState::Closed);
        handle.cancel();

        let report = tokio::time::timeout(Duration::from_secs(5), handle.finished())
            .await
            .expect("cancel should end the session promptly");
        assert_eq!(report.outcome, StreamOutcome::Cancelled);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let server = MockServer::start().await;
        mount_stream(&server, "d1", sse(&[COMPLETE_LINE])).await;

        let (sink, _rx) = ChannelSink::channel();
        let handle = client_for(&server).stream_review_with("d1", ["p1"], sink);
        let cancel = handle.cancel_handle();
        let report = handle.finished().await;

        assert_eq!(report.outcome, StreamOutcome::Completed);
        cancel.cancel();
        cancel.cancel();
        assert_eq!(cancel.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let server = MockServer::start().await;
        mount_stream(&server, "a", sse(&[STATUS_LINE, COMPLETE_LINE])).await;
        mount_stream(&server, "b", sse(&[COMMENT_LINE])).await;

        let client = client_for(&server);
        let (sink_a, mut rx_a) = ChannelSink::channel();
        let (sink_b, mut rx_b) = ChannelSink::channel();
        let a = client.stream_review_with("a", ["p1"], sink_a);
        let b = client.stream_review_with("b", ["p1"], sink_b);

        let (report_a, report_b) = tokio::join!(a.finished(), b.finished());
        assert_eq!(report_a.stats.events, 2);
        assert_eq!(report_b.stats.events, 1);
        assert_eq!(drain(&mut rx_a).len(), 2);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    fn pending_after(first: &str) -> BoxStream<'static, Result<Bytes, io::Error>> {
        stream::iter(vec![Ok(Bytes::from(format!("{first}\n")))])
            .chain(stream::pending())
            .boxed()
    }

    #[tokio::test]
    async fn test_cancel_during_pending_read() {
        let cancel = CancelHandle::new();
        cancel.state.advance(SessionState::Connecting);
        let (sink, mut rx) = ChannelSink::channel();
        let mut dispatcher = Dispatcher::new(sink, cancel.gate.clone());

        let trigger = cancel.clone();
        let (report, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(
                stream_body(Some(pending_after(STATUS_LINE)), 200, &mut dispatcher, &cancel),
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    assert_eq!(trigger.state(), SessionState::Streaming);
                    trigger.cancel();
                    trigger.cancel();
                }
            )
        })
        .await
        .expect("cancel should unblock the pending read");

        assert_eq!(report.outcome, StreamOutcome::Cancelled);
        assert_eq!(cancel.state(), SessionState::Closed);
        assert_eq!(drain(&mut rx).len(), 1);
        assert!(!dispatcher.is_open());
    }

    #[tokio::test]
    async fn test_transport_failure_mid_stream() {
        let cancel = CancelHandle::new();
        let (sink, mut rx) = ChannelSink::channel();
        let mut dispatcher = Dispatcher::new(sink, cancel.gate.clone());

        let body = stream::iter(vec![
            Ok(Bytes::from(format!("{STATUS_LINE}\n"))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ]);
        let report = stream_body(Some(body), 200, &mut dispatcher, &cancel).await;

        assert_eq!(report.outcome.error().unwrap().code, ApiError::NETWORK);
        let items = drain(&mut rx);
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
        assert_eq!(cancel.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_review_events_pull_style() {
        let server = MockServer::start().await;
        mount_stream(&server, "d1", sse(&[STATUS_LINE, ERROR_LINE, COMPLETE_LINE])).await;

        let mut events = client_for(&server).review_events("d1", ["p1"]).await.unwrap();
        assert_eq!(events.state(), SessionState::Streaming);

        let mut kinds = Vec::new();
        while let Some(item) = events.next().await {
            kinds.push(match item {
                Ok(event) => event.kind().to_string(),
                Err(err) => err.code,
            });
        }
        assert_eq!(kinds, vec!["status", "llm_timeout", "complete"]);
        assert_eq!(events.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_review_events_cancel() {
        let server = MockServer::start().await;
        mount_stream(&server, "d1", sse(&[STATUS_LINE, COMPLETE_LINE])).await;

        let mut events = client_for(&server).review_events("d1", ["p1"]).await.unwrap();
        events.cancel();
        events.cancel();
        assert_eq!(events.state(), SessionState::Closed);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_review_events_setup_failure() {
        let server = MockServer::start().await;
        mount_stream(
            &server,
            "d1",
            ResponseTemplate::new(403).set_body_json(json!({"detail": "CSRF token missing"})),
        )
        .await;

        let err = client_for(&server).review_events("d1", ["p1"]).await.unwrap_err();
        assert_eq!(err.status, Some(403));
        assert_eq!(err.code, ApiError::UNKNOWN);
        assert_eq!(err.detail, "CSRF token missing");
    }

    #[test]
    fn test_state_transitions() {
        let state = SharedState::new();
        assert_eq!(state.get(), SessionState::Idle);
        assert!(state.advance(SessionState::Connecting));
        assert!(state.close());
        assert!(!state.close());
        assert!(!state.advance(SessionState::Streaming));
        assert_eq!(state.get().to_string(), "closed");
    }
}
