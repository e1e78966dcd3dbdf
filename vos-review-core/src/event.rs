//! Review stream events.
//!
//! Each `data: ` line of the review stream carries one JSON object whose
//! `type` field selects the variant.

use crate::comment::Comment;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Progress of one persona within a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaStatus {
    /// Waiting for a worker.
    Queued,
    /// Reading the document.
    Running,
    /// Finished producing comments.
    Completed,
}

/// An event delivered by the review stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// A persona changed status.
    Status {
        /// Persona identifier.
        persona_id: String,
        /// Persona display name.
        persona_name: String,
        /// Persona display color.
        persona_color: String,
        /// New status.
        status: PersonaStatus,
    },

    /// A persona produced a comment.
    Comment {
        /// The full comment record.
        comment: Comment,
    },

    /// The review finished.
    Complete {
        /// Identifier of the stored review.
        review_id: String,
        /// Number of comments produced across all personas.
        total_comments: u32,
    },

    /// The backend reported a failure.
    Error {
        /// Error keyword.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Human readable detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ReviewEvent {
    /// The wire discriminator of this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Comment { .. } => "comment",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Check if this is an `error` event.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Check if this event announces the end of the review.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// The persona this event concerns, if any.
    #[must_use]
    pub fn persona_id(&self) -> Option<&str> {
        match self {
            Self::Status { persona_id, .. } => Some(persona_id),
            Self::Comment { comment } => Some(&comment.persona_id),
            _ => None,
        }
    }

    /// Convert an `error` event into the structured error shape.
    ///
    /// Returns `None` for every other variant.
    #[must_use]
    pub fn to_api_error(&self) -> Option<ApiError> {
        match self {
            Self::Error { error, detail } => Some(ApiError::from_stream_event(
                error.as_deref(),
                detail.as_deref(),
            )),
            _ => None,
        }
    }
}

/// Body of the request that opens a review stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStreamRequest {
    /// Personas that take part in the review.
    pub persona_ids: Vec<String>,
}

impl ReviewStreamRequest {
    /// Create a request for the given personas.
    pub fn new<I, S>(persona_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            persona_ids: persona_ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_event() {
        let json = r##"{"type":"status","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","status":"running"}"##;
        let event: ReviewEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ReviewEvent::Status {
                persona_id: "p1".into(),
                persona_name: "Sec".into(),
                persona_color: "#f00".into(),
                status: PersonaStatus::Running,
            }
        );
        assert_eq!(event.kind(), "status");
        assert_eq!(event.persona_id(), Some("p1"));
    }

    #[test]
    fn test_complete_event() {
        let event: ReviewEvent =
            serde_json::from_str(r#"{"type":"complete","review_id":"r9","total_comments":12}"#)
                .unwrap();
        assert!(event.is_terminal());
        assert!(!event.is_error());
        assert_eq!(event.persona_id(), None);
    }

    #[test]
    fn test_error_event_fields_optional() {
        let event: ReviewEvent = serde_json::from_str(r#"{"type":"error"}"#).unwrap();
        assert!(event.is_error());
        let err = event.to_api_error().unwrap();
        assert_eq!(err.code, ApiError::STREAM_ERROR);

        let event: ReviewEvent =
            serde_json::from_str(r#"{"type":"error","error":"llm_error","detail":"boom"}"#)
                .unwrap();
        let err = event.to_api_error().unwrap();
        assert_eq!(err.code, "llm_error");
        assert_eq!(err.detail, "boom");
        assert_eq!(err.status, None);
    }

    #[test]
    fn test_comment_event_nested_anchor() {
        let json = r##"{"type":"comment","comment":{"id":"c1","content":"issue","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","anchor":{"file_path":"doc.md","start_line":3,"end_line":3},"document_id":"d1","version_hash":"abc123","created_at":"2024-01-01T00:00:00"}}"##;
        let event: ReviewEvent = serde_json::from_str(json).unwrap();
        match event {
            ReviewEvent::Comment { comment } => {
                assert_eq!(comment.anchor().start_line, 3);
                assert_eq!(comment.anchor().file_path.as_deref(), Some("doc.md"));
                assert!(comment.is_anchored_to("abc123"));
            }
            other => panic!("Expected comment event, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result = serde_json::from_str::<ReviewEvent>(
            r#"{"type":"status","persona_id":"p1","status":"running"}"#,
        );
        assert!(result.is_err());

        let result = serde_json::from_str::<ReviewEvent>(r#"{"type":"heartbeat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_stream_request_body() {
        let body = ReviewStreamRequest::new(["security", "clarity"]);
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"persona_ids":["security","clarity"]}"#
        );
    }
}
