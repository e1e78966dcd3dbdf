//! # vos-review-core
//!
//! Core types shared by the VOS review client crates.
//!
//! - **Events**: [`ReviewEvent`], the tagged union carried by the review stream
//! - **Comments**: persona comments anchored to a line range of one document version
//! - **Documents, personas, reviews**: the records returned by the REST backend
//! - **Errors**: [`ApiError`], the one shape every failed request is normalized into
//!
//! ## Example
//!
//! ```rust
//! use vos_review_core::{ApiError, ReviewEvent};
//!
//! let line = r#"{"type":"complete","review_id":"r1","total_comments":4}"#;
//! let event: ReviewEvent = serde_json::from_str(line).unwrap();
//! assert!(event.is_terminal());
//!
//! let err = ApiError::from_body(404, br#"{"error":"not_found","detail":"doc missing"}"#, "request failed");
//! assert_eq!(err.code, "not_found");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod comment;
pub mod document;
pub mod error;
pub mod event;
pub mod persona;
pub mod review;
pub mod timestamp;

pub use comment::{Comment, LineAnchor, MetaComment, MetaCommentSource, MetaPriority};
pub use document::{
    Document, DocumentContent, DocumentDiff, DocumentUpdate, DocumentVersion, NewDocument,
};
pub use error::{ApiError, ApiResult};
pub use event::{PersonaStatus, ReviewEvent, ReviewStreamRequest};
pub use persona::{Persona, PersonaTone, PersonaWeightUpdate};
pub use review::{JobStatus, ReviewJob, ReviewSummary};
