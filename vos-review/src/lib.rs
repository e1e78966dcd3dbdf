//! # vos-review
//!
//! Client for the VOS document review backend. Several review personas read
//! a document concurrently on the server; this crate opens the review
//! stream, decodes it incrementally and hands each persona's progress and
//! comments to the caller in the order the server sent them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vos_review::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ApiError> {
//!     let client = ApiClient::from_env()?;
//!
//!     let mut events = client.review_events("doc-1", ["security"]).await?;
//!     while let Some(item) = events.next().await {
//!         match item {
//!             Ok(ReviewEvent::Comment { comment }) => {
//!                 println!("{}: {}", comment.persona_name, comment.content);
//!             }
//!             Ok(other) => println!("{} event", other.kind()),
//!             Err(error) => eprintln!("review error: {error}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`vos_review_core`] - Data model and the [`ApiError`] shape
//! - [`vos_review_streaming`] - Line decoding, event parsing and dispatch
//! - [`vos_review_client`] - REST client and review stream sessions

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// Crate re-exports
// ============================================================================

/// Data model and errors.
pub use vos_review_core as core;

/// Stream decoding and dispatch.
pub use vos_review_streaming as streaming;

/// REST client and sessions.
pub use vos_review_client as client;

// ============================================================================
// Type re-exports
// ============================================================================

pub use vos_review_core::{
    ApiError, ApiResult, Comment, Document, DocumentContent, DocumentDiff, DocumentUpdate,
    DocumentVersion, JobStatus, LineAnchor, MetaComment, MetaCommentSource, MetaPriority,
    NewDocument, Persona, PersonaStatus, PersonaTone, PersonaWeightUpdate, ReviewEvent,
    ReviewJob, ReviewStreamRequest, ReviewSummary,
};

pub use vos_review_streaming::{
    CallbackSink, ChannelSink, EventSink, EventStream, StreamOutcome, StreamReport, StreamStats,
};

pub use vos_review_client::{
    ApiClient, CancelHandle, ClientConfig, ReviewEvents, SessionState, StreamHandle,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ApiClient, ApiError, ApiResult, CancelHandle, ClientConfig, Comment, EventSink,
        PersonaStatus, ReviewEvent, ReviewEvents, SessionState, StreamHandle, StreamOutcome,
        StreamReport,
    };
    pub use futures::StreamExt;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let config = ClientConfig::default();
        assert_eq!(config.api_prefix, "/api/v1");
        assert!(!SessionState::Idle.is_closed());
        assert!(StreamOutcome::Cancelled.is_success());
    }
}
