//! Pull-style event stream.
//!
//! [`EventStream`] wraps a byte-stream body and yields one item per event:
//! `Ok` for normal events, `Err` for `error` events. A read or decode
//! failure yields a final `Err` and ends the stream.

use crate::dispatch::Classified;
use crate::pipeline::{EventPipeline, StreamStats};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use vos_review_core::{ApiError, ReviewEvent};

pin_project! {
    /// Stream adapter that decodes review events from a byte stream.
    pub struct EventStream<S> {
        #[pin]
        inner: S,
        pipeline: EventPipeline,
        pending: VecDeque<Classified>,
        finished: bool,
    }
}

impl<S> fmt::Debug for EventStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("pipeline", &self.pipeline)
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<S> EventStream<S> {
    /// Wrap a byte stream.
    pub fn new(inner: S) -> Self {
        Self::with_pipeline(inner, EventPipeline::new())
    }

    /// Wrap a byte stream with a configured pipeline.
    pub fn with_pipeline(inner: S, pipeline: EventPipeline) -> Self {
        Self {
            inner,
            pipeline,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.pipeline.stats()
    }
}

impl<S, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    type Item = Result<ReviewEvent, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Buffered events first
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item.into_result()));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => match this.pipeline.feed(&bytes) {
                    Ok(items) => this.pending.extend(items),
                    Err(err) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(err.into())));
                    }
                },
                Poll::Ready(Some(Err(err))) => {
                    *this.finished = true;
                    let error = ApiError::transport(err.to_string());
                    tracing::warn!(detail = %error.detail, "Review stream read failed");
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.pipeline.finish();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
