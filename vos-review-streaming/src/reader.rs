//! Transport reader.
//!
//! Pulls byte chunks from a response body until the body ends, a read
//! fails, or the session's cancellation token fires.

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Result of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A chunk arrived.
    Chunk(Bytes),
    /// The body ended normally.
    End,
    /// The caller cancelled the session.
    Cancelled,
}

/// Reads a byte-stream body chunk by chunk, honoring cancellation.
///
/// Once the reader has returned [`ReadOutcome::End`],
/// [`ReadOutcome::Cancelled`] or an error, it keeps returning the same
/// terminal answer without touching the body again.
pub struct ChunkReader<S> {
    body: S,
    cancel: CancellationToken,
    finished: Option<ReadOutcome>,
}

impl<S> fmt::Debug for ChunkReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkReader")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<S, E> ChunkReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    /// Wrap a body.
    pub fn new(body: S, cancel: CancellationToken) -> Self {
        Self {
            body,
            cancel,
            finished: None,
        }
    }

    /// Wrap a body that may be absent.
    ///
    /// A missing body is a setup failure: the session never starts reading.
    pub fn open(body: Option<S>, cancel: CancellationToken) -> StreamResult<Self> {
        body.map(|body| Self::new(body, cancel))
            .ok_or(StreamError::MissingBody)
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The token this reader watches.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait for the next chunk.
    ///
    /// Cancellation wins over a chunk that is ready at the same time, and a
    /// pending read resolves as soon as the token fires.
    pub async fn next_chunk(&mut self) -> StreamResult<ReadOutcome> {
        if let Some(outcome) = &self.finished {
            return Ok(outcome.clone());
        }

        let next = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            next = self.body.next() => Some(next),
        };

        match next {
            None => {
                self.finished = Some(ReadOutcome::Cancelled);
                Ok(ReadOutcome::Cancelled)
            }
            Some(Some(Ok(chunk))) => Ok(ReadOutcome::Chunk(chunk)),
            Some(Some(Err(err))) => {
                // A read torn down by cancellation is not a failure.
                if self.cancel.is_cancelled() {
                    self.finished = Some(ReadOutcome::Cancelled);
                    return Ok(ReadOutcome::Cancelled);
                }
                self.finished = Some(ReadOutcome::End);
                Err(StreamError::transport(err))
            }
            Some(None) => {
                self.finished = Some(ReadOutcome::End);
                Ok(ReadOutcome::End)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;
    use std::time::Duration;

    type Body = stream::BoxStream<'static, Result<Bytes, io::Error>>;

    fn body(chunks: &[&'static str]) -> Body {
        let items: Vec<Result<Bytes, io::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn test_reads_until_end() {
        let mut reader = ChunkReader::new(body(&["a", "b"]), CancellationToken::new());

        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::Chunk(Bytes::from("a")));
        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::Chunk(Bytes::from("b")));
        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::End);
        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::End);
    }

    #[tokio::test]
    async fn test_read_error_is_reported_once() {
        let items: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from("a")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
            Ok(Bytes::from("never")),
        ];
        let mut reader = ChunkReader::new(stream::iter(items).boxed(), CancellationToken::new());

        assert!(matches!(reader.next_chunk().await, Ok(ReadOutcome::Chunk(_))));
        let err = reader.next_chunk().await.unwrap_err();
        assert!(err.to_string().contains("reset by peer"));
        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::End);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_pending_read() {
        let cancel = CancellationToken::new();
        let pending: Body = stream::pending().boxed();
        let mut reader = ChunkReader::new(pending, cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), reader.next_chunk())
            .await
            .expect("cancellation should unblock the read");
        assert_eq!(outcome.unwrap(), ReadOutcome::Cancelled);
        assert!(reader.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_wins_over_ready_chunk() {
        let cancel = CancellationToken::new();
        let mut reader = ChunkReader::new(body(&["ready"]), cancel.clone());
        cancel.cancel();

        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::Cancelled);
        assert_eq!(reader.next_chunk().await.unwrap(), ReadOutcome::Cancelled);
    }

    #[test]
    fn test_open_without_body() {
        let result = ChunkReader::<Body>::open(None, CancellationToken::new());
        assert!(matches!(result, Err(StreamError::MissingBody)));

        let result = ChunkReader::open(Some(body(&[])), CancellationToken::new());
        assert!(result.is_ok());
    }
}
