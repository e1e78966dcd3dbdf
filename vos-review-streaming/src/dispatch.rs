//! Event classification and dispatch.
//!
//! Parsed events are routed to one of two destinations: `error` events go to
//! the error side as an [`ApiError`], every other event is forwarded as is.
//! The [`Dispatcher`] delivers them to an [`EventSink`] in arrival order and
//! stops delivering the moment the session is cancelled or closed.

use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vos_review_core::{ApiError, ReviewEvent};

/// An event after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A normal event for the event side.
    Event(ReviewEvent),
    /// An in-stream `error` event for the error side.
    Error(ApiError),
}

impl Classified {
    /// Convert into the item type of the pull-style stream.
    pub fn into_result(self) -> Result<ReviewEvent, ApiError> {
        match self {
            Self::Event(event) => Ok(event),
            Self::Error(error) => Err(error),
        }
    }
}

/// Route an event by its `type` discriminator.
#[must_use]
pub fn classify(event: ReviewEvent) -> Classified {
    match event.to_api_error() {
        Some(error) => Classified::Error(error),
        None => Classified::Event(event),
    }
}

/// Receiver of a session's events and errors.
pub trait EventSink: Send {
    /// Called for each non-error event.
    fn on_event(&mut self, event: ReviewEvent);

    /// Called for each in-stream error event and for the terminal failure.
    fn on_error(&mut self, error: ApiError);
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn on_event(&mut self, event: ReviewEvent) {
        (**self).on_event(event);
    }

    fn on_error(&mut self, error: ApiError) {
        (**self).on_error(error);
    }
}

/// A sink built from two closures.
pub struct CallbackSink<E, F> {
    on_event: E,
    on_error: F,
}

impl<E, F> CallbackSink<E, F>
where
    E: FnMut(ReviewEvent) + Send,
    F: FnMut(ApiError) + Send,
{
    /// Create a sink from an event callback and an error callback.
    pub fn new(on_event: E, on_error: F) -> Self {
        Self { on_event, on_error }
    }
}

impl<E, F> fmt::Debug for CallbackSink<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

impl<E, F> EventSink for CallbackSink<E, F>
where
    E: FnMut(ReviewEvent) + Send,
    F: FnMut(ApiError) + Send,
{
    fn on_event(&mut self, event: ReviewEvent) {
        (self.on_event)(event);
    }

    fn on_error(&mut self, error: ApiError) {
        (self.on_error)(error);
    }
}

/// A sink that forwards into an unbounded channel, one item per callback.
///
/// The channel is unbounded so dispatch never waits on the consumer; order
/// is preserved because a single task sends.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Result<ReviewEvent, ApiError>>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Result<ReviewEvent, ApiError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, event: ReviewEvent) {
        if self.tx.send(Ok(event)).is_err() {
            tracing::trace!("Review event receiver dropped");
        }
    }

    fn on_error(&mut self, error: ApiError) {
        if self.tx.send(Err(error)).is_err() {
            tracing::trace!("Review event receiver dropped");
        }
    }
}

/// Counters kept by a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events delivered to the event side.
    pub events: u64,
    /// In-stream error events delivered to the error side.
    pub error_events: u64,
    /// Items dropped because the session was already closed or cancelled.
    pub suppressed: u64,
}

/// Cancellation shared by a session and its dispatcher.
///
/// Delivery to the sink and [`CancelGate::cancel`] exclude each other: once
/// `cancel` returns, no callback is running on another thread and none will
/// start. A callback may cancel its own session.
#[derive(Debug, Clone, Default)]
pub struct CancelGate {
    token: CancellationToken,
    delivery: Arc<ReentrantMutex<()>>,
}

impl CancelGate {
    /// Create an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying token, for waiting on cancellation.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel, waiting for a callback in progress on another thread.
    pub fn cancel(&self) {
        let _delivery = self.delivery.lock();
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `deliver` unless cancelled, holding off `cancel` meanwhile.
    fn deliver<R>(&self, deliver: impl FnOnce() -> R) -> Option<R> {
        let _delivery = self.delivery.lock();
        if self.token.is_cancelled() {
            return None;
        }
        Some(deliver())
    }
}

impl From<CancellationToken> for CancelGate {
    fn from(token: CancellationToken) -> Self {
        Self {
            token,
            delivery: Arc::default(),
        }
    }
}

/// Delivers classified items to a sink, gated by the session lifecycle.
///
/// Once closed, by [`Dispatcher::close`], [`Dispatcher::fail`] or the
/// cancellation token, the sink is never called again.
pub struct Dispatcher<K> {
    sink: K,
    cancel: CancelGate,
    closed: bool,
    stats: DispatchStats,
}

impl<K> fmt::Debug for Dispatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.closed)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<K: EventSink> Dispatcher<K> {
    /// Create a dispatcher for one session.
    pub fn new(sink: K, cancel: impl Into<CancelGate>) -> Self {
        Self {
            sink,
            cancel: cancel.into(),
            closed: false,
            stats: DispatchStats::default(),
        }
    }

    /// Check if the sink may still be called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed && !self.cancel.is_cancelled()
    }

    /// Check if the session was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Deliver one item. Returns `false` if it was suppressed.
    pub fn dispatch(&mut self, item: Classified) -> bool {
        if self.closed {
            self.stats.suppressed += 1;
            return false;
        }

        let sink = &mut self.sink;
        let stats = &mut self.stats;
        let delivered = self.cancel.deliver(|| match item {
            Classified::Event(event) => {
                stats.events += 1;
                sink.on_event(event);
            }
            Classified::Error(error) => {
                tracing::debug!(
                    code = %error.code,
                    detail = %error.detail,
                    "Review stream error event"
                );
                stats.error_events += 1;
                sink.on_error(error);
            }
        });

        if delivered.is_none() {
            self.stats.suppressed += 1;
            return false;
        }
        true
    }

    /// Report the terminal failure of the session and close it.
    ///
    /// Swallowed if the session is already closed or was cancelled, so a
    /// session reports at most one terminal failure.
    pub fn fail(&mut self, error: ApiError) -> bool {
        let was_closed = std::mem::replace(&mut self.closed, true);
        let code = error.code.clone();
        let sink = &mut self.sink;
        let reported = !was_closed && self.cancel.deliver(|| sink.on_error(error)).is_some();

        if !reported {
            tracing::debug!(code = %code, "Suppressing failure after close");
        }
        reported
    }

    /// Close without reporting anything.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Give the sink back.
    pub fn into_sink(self) -> K {
        self.sink
    }
}
