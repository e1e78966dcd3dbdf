//! The read loop.
//!
//! [`EventPipeline`] is the synchronous part: bytes in, classified events
//! out. [`drive`] is the asynchronous part: it pulls chunks from a
//! [`ChunkReader`] and hands everything the pipeline produces to a
//! [`Dispatcher`] until the body ends, a read fails, or the session is
//! cancelled.

use crate::decoder::LineDecoder;
use crate::dispatch::{classify, Classified, Dispatcher, EventSink};
use crate::error::StreamResult;
use crate::parser::{parse_line, ParsedLine};
use crate::reader::{ChunkReader, ReadOutcome};
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use vos_review_core::ApiError;

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes received.
    pub bytes: u64,
    /// Complete lines decoded.
    pub lines: u64,
    /// Non-error events parsed.
    pub events: u64,
    /// `error` events parsed.
    pub error_events: u64,
    /// `data: ` lines that did not decode.
    pub skipped_lines: u64,
    /// Lines without the `data: ` marker.
    pub ignored_lines: u64,
}

/// Decoder and parser for one session.
#[derive(Debug, Default)]
pub struct EventPipeline {
    decoder: LineDecoder,
    stats: StreamStats,
}

impl EventPipeline {
    /// Create a pipeline with the default line limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline around a configured decoder.
    #[must_use]
    pub fn with_decoder(decoder: LineDecoder) -> Self {
        Self {
            decoder,
            stats: StreamStats::default(),
        }
    }

    /// Feed one chunk and return the events it completed, in line order.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<Classified>> {
        self.stats.bytes += chunk.len() as u64;
        let lines = self.decoder.feed(chunk)?;

        let mut out = Vec::with_capacity(lines.len());
        for line in &lines {
            self.stats.lines += 1;
            match parse_line(line) {
                ParsedLine::Ignored => self.stats.ignored_lines += 1,
                ParsedLine::Malformed(_) => self.stats.skipped_lines += 1,
                ParsedLine::Event(event) => {
                    let item = classify(event);
                    match item {
                        Classified::Event(_) => self.stats.events += 1,
                        Classified::Error(_) => self.stats.error_events += 1,
                    }
                    out.push(item);
                }
            }
        }
        Ok(out)
    }

    /// End of input. Any unterminated trailing line is dropped.
    pub fn finish(&mut self) {
        if let Some(fragment) = self.decoder.finish() {
            tracing::debug!(
                bytes = fragment.len(),
                "Dropping unterminated line at end of review stream"
            );
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The body ended normally.
    Completed,
    /// The caller cancelled.
    Cancelled,
    /// A setup, transport or decode failure ended the session.
    ///
    /// The same error was delivered to the error side exactly once.
    Failed(ApiError),
}

impl StreamOutcome {
    /// Check if the session ended without a terminal failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// The terminal failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for StreamOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed(err) => write!(f, "failed ({err})"),
        }
    }
}

/// Outcome and counters of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    /// How the session ended.
    pub outcome: StreamOutcome,
    /// What went through the pipeline.
    pub stats: StreamStats,
}

impl StreamReport {
    /// A session that failed before reading anything.
    #[must_use]
    pub fn setup_failed(error: ApiError) -> Self {
        Self {
            outcome: StreamOutcome::Failed(error),
            stats: StreamStats::default(),
        }
    }

    /// A session cancelled before reading anything.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            outcome: StreamOutcome::Cancelled,
            stats: StreamStats::default(),
        }
    }
}

/// Run the read loop to completion.
///
/// Delivers every event in line order, then closes the dispatcher. A read or
/// decode failure is reported once through the dispatcher; a failure that
/// coincides with cancellation is not reported at all.
pub async fn drive<S, E, K>(reader: ChunkReader<S>, dispatcher: &mut Dispatcher<K>) -> StreamReport
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
    K: EventSink,
{
    drive_with(reader, EventPipeline::new(), dispatcher).await
}

/// Run the read loop with a configured pipeline.
pub async fn drive_with<S, E, K>(
    mut reader: ChunkReader<S>,
    mut pipeline: EventPipeline,
    dispatcher: &mut Dispatcher<K>,
) -> StreamReport
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
    K: EventSink,
{
    let outcome = loop {
        let chunk = match reader.next_chunk().await {
            Ok(ReadOutcome::Chunk(chunk)) => chunk,
            Ok(ReadOutcome::End) => {
                pipeline.finish();
                break StreamOutcome::Completed;
            }
            Ok(ReadOutcome::Cancelled) => break StreamOutcome::Cancelled,
            Err(err) => break fail(dispatcher, err.into()),
        };

        match pipeline.feed(&chunk) {
            Ok(items) => {
                for item in items {
                    dispatcher.dispatch(item);
                }
                if dispatcher.is_cancelled() {
                    break StreamOutcome::Cancelled;
                }
            }
            Err(err) => break fail(dispatcher, err.into()),
        }
    };

    dispatcher.close();

    let stats = pipeline.stats();
    tracing::debug!(
        outcome = %outcome,
        lines = stats.lines,
        events = stats.events,
        error_events = stats.error_events,
        skipped_lines = stats.skipped_lines,
        "Review stream closed"
    );

    StreamReport { outcome, stats }
}

fn fail<K: EventSink>(dispatcher: &mut Dispatcher<K>, error: ApiError) -> StreamOutcome {
    if dispatcher.fail(error.clone()) {
        tracing::warn!(code = %error.code, detail = %error.detail, "Review stream failed");
        StreamOutcome::Failed(error)
    } else {
        StreamOutcome::Cancelled
    }
}
