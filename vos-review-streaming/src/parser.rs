//! Event parser.
//!
//! Only lines starting with `data: ` carry events. Everything else is
//! ignored, including keep-alive and comment lines. A `data: ` line whose
//! payload does not decode into a [`ReviewEvent`] is skipped: the stream
//! may carry partial or vendor lines that were never meant to be decoded,
//! and one bad line must not end the session.

use vos_review_core::ReviewEvent;

/// Marker that starts every event line.
pub const DATA_PREFIX: &str = "data: ";

const LOG_PREVIEW_CHARS: usize = 120;

/// What a single line turned out to be.
#[derive(Debug)]
pub enum ParsedLine {
    /// Not an event line.
    Ignored,
    /// A decoded event.
    Event(ReviewEvent),
    /// An event line whose payload did not decode.
    Malformed(serde_json::Error),
}

impl ParsedLine {
    /// Take the event, if the line produced one.
    #[must_use]
    pub fn into_event(self) -> Option<ReviewEvent> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Parse one complete line.
pub fn parse_line(line: &str) -> ParsedLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return ParsedLine::Ignored;
    };

    match serde_json::from_str::<ReviewEvent>(payload) {
        Ok(event) => ParsedLine::Event(event),
        Err(err) => {
            tracing::warn!(
                error = %err,
                line = %preview(payload),
                "Skipping malformed review stream line"
            );
            ParsedLine::Malformed(err)
        }
    }
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vos_review_core::PersonaStatus;

    #[test]
    fn test_parses_data_line() {
        let line = r##"data: {"type":"status","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","status":"queued"}"##;
        match parse_line(line) {
            ParsedLine::Event(ReviewEvent::Status { status, .. }) => {
                assert_eq!(status, PersonaStatus::Queued);
            }
            other => panic!("Expected status event, got {other:?}"),
        }
    }

    #[rstest]
    #[case::nested_anchor(r##"data: {"type":"comment","comment":{"id":"c1","content":"issue","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","anchor":{"file_path":"doc.md","start_line":3,"end_line":3},"created_at":"2024-01-01T00:00:00Z"}}"##)]
    #[case::flat_range(r##"data: {"type":"comment","comment":{"id":"c1","content":"issue","persona_id":"p1","persona_name":"Sec","persona_color":"#f00","start_line":3,"end_line":3,"created_at":"2024-01-01T00:00:00Z"}}"##)]
    fn test_parses_comment_line(#[case] line: &str) {
        match parse_line(line) {
            ParsedLine::Event(ReviewEvent::Comment { comment }) => {
                assert_eq!(comment.anchor().start_line, 3);
                assert_eq!(comment.anchor().end_line, 3);
            }
            other => panic!("Expected comment event, got {other:?}"),
        }
    }

    #[rstest]
    #[case::empty("")]
    #[case::comment(": keep-alive")]
    #[case::event_field("event: message")]
    #[case::no_space(r#"data:{"type":"complete","review_id":"r","total_comments":0}"#)]
    #[case::indented(r#" data: {"type":"complete","review_id":"r","total_comments":0}"#)]
    fn test_non_data_lines_are_ignored(#[case] line: &str) {
        assert!(matches!(parse_line(line), ParsedLine::Ignored));
    }

    #[rstest]
    #[case::truncated(r#"data: {"type":"comm"#)]
    #[case::done("data: [DONE]")]
    #[case::empty_payload("data: ")]
    #[case::unknown_type(r#"data: {"type":"heartbeat"}"#)]
    #[case::missing_field(r#"data: {"type":"complete","review_id":"r"}"#)]
    fn test_malformed_lines_are_reported(#[case] line: &str) {
        assert!(matches!(parse_line(line), ParsedLine::Malformed(_)));
    }

    #[test]
    fn test_into_event() {
        let line = r#"data: {"type":"error","error":"llm_error"}"#;
        let event = parse_line(line).into_event().unwrap();
        assert!(event.is_error());
        assert!(parse_line("ping").into_event().is_none());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(500);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
