//! # vos-review-streaming
//!
//! Incremental decoding and dispatch of the review event stream.
//!
//! A review stream is an HTTP response body made of newline-delimited text
//! lines. Lines starting with `data: ` carry one JSON [`ReviewEvent`] each;
//! every other line is ignored. This crate turns such a body into an ordered
//! sequence of events without knowing anything about HTTP:
//!
//! - **[`ChunkReader`]**: pulls chunks from a body, honoring cancellation
//! - **[`LineDecoder`]**: bytes cut at arbitrary points into complete lines
//! - **[`parse_line`]**: one line into an event, skipping malformed payloads
//! - **[`Dispatcher`]**: routes events and `error` events to an [`EventSink`]
//! - **[`drive`]**: the read loop tying all of the above together
//! - **[`EventStream`]**: the same pipeline as a pull-style [`futures::Stream`]
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use futures::{stream, StreamExt};
//! use vos_review_streaming::EventStream;
//!
//! # tokio_test::block_on(async {
//! let body = stream::iter(vec![
//!     Ok::<_, std::io::Error>(Bytes::from(": keep-alive\ndata: {\"type\":\"comp")),
//!     Ok(Bytes::from("lete\",\"review_id\":\"r1\",\"total_comments\":0}\n")),
//! ]);
//!
//! let events: Vec<_> = EventStream::new(body).collect().await;
//! assert_eq!(events.len(), 1);
//! assert!(events[0].as_ref().unwrap().is_terminal());
//! # });
//! ```
//!
//! [`ReviewEvent`]: vos_review_core::ReviewEvent

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod stream;

// Re-exports
pub use decoder::{LineDecoder, MAX_LINE_BYTES};
pub use dispatch::{
    classify, CallbackSink, CancelGate, ChannelSink, Classified, DispatchStats, Dispatcher,
    EventSink,
};
pub use error::{StreamError, StreamResult};
pub use parser::{parse_line, ParsedLine, DATA_PREFIX};
pub use pipeline::{drive, drive_with, EventPipeline, StreamOutcome, StreamReport, StreamStats};
pub use reader::{ChunkReader, ReadOutcome};
pub use stream::EventStream;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        drive, CallbackSink, ChannelSink, ChunkReader, Dispatcher, EventSink, EventStream,
        StreamOutcome, StreamReport, StreamStats,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let stats = StreamStats::default();
        assert_eq!(stats.events, 0);
        assert!(StreamOutcome::Completed.is_success());
    }
}
