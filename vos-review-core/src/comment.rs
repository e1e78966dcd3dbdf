//! Persona comments and merged meta-comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A 1-based, inclusive line range inside one document version.
///
/// Character offsets narrow the range to a span within its first and last
/// line when the reviewer pointed at one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineAnchor {
    /// File inside the document repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// First line covered.
    pub start_line: u32,
    /// Last line covered.
    pub end_line: u32,
    /// Offset into the first line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_char: Option<u32>,
    /// Offset into the last line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_char: Option<u32>,
}

impl LineAnchor {
    /// Create an anchor. The bounds are swapped if given in reverse.
    #[must_use]
    pub const fn new(start_line: u32, end_line: u32) -> Self {
        let (start_line, end_line) = if start_line <= end_line {
            (start_line, end_line)
        } else {
            (end_line, start_line)
        };
        Self {
            file_path: None,
            start_line,
            end_line,
            start_char: None,
            end_char: None,
        }
    }

    /// Set the file the range points into.
    #[must_use]
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    /// Check if `line` falls inside the range.
    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Number of lines covered.
    #[must_use]
    pub const fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A comment produced by one review persona.
///
/// The anchor refers to the document version the review ran against, not to
/// live line numbers; it stays meaningful only for that version.
///
/// Records arrive with the range nested under `anchor` or, from older
/// stream producers, as flat `start_line`/`end_line` fields. Both read into
/// [`Comment::anchor`]; serialization always writes the nested form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CommentRecord")]
pub struct Comment {
    /// Comment identifier.
    pub id: String,
    /// Comment text.
    pub content: String,
    /// Authoring persona.
    pub persona_id: String,
    /// Authoring persona display name.
    pub persona_name: String,
    /// Authoring persona display color.
    pub persona_color: String,
    /// Anchored range.
    pub anchor: LineAnchor,
    /// Document the comment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Commit hash of the reviewed version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_hash: Option<String>,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// The line range this comment is anchored to.
    #[must_use]
    pub const fn anchor(&self) -> &LineAnchor {
        &self.anchor
    }

    /// Check if the comment was made against the given version.
    ///
    /// Comments without a recorded version never match.
    #[must_use]
    pub fn is_anchored_to(&self, version_hash: &str) -> bool {
        self.version_hash.as_deref() == Some(version_hash)
    }
}

#[derive(Deserialize)]
struct CommentRecord {
    id: String,
    content: String,
    persona_id: String,
    persona_name: String,
    persona_color: String,
    #[serde(default)]
    anchor: Option<LineAnchor>,
    #[serde(default)]
    start_line: Option<u32>,
    #[serde(default)]
    end_line: Option<u32>,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default)]
    version_hash: Option<String>,
    #[serde(with = "crate::timestamp")]
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRecord> for Comment {
    type Error = &'static str;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let anchor = match (record.anchor, record.start_line, record.end_line) {
            (Some(anchor), _, _) => anchor,
            (None, Some(start), Some(end)) => LineAnchor::new(start, end),
            (None, Some(line), None) => LineAnchor::new(line, line),
            (None, None, _) => return Err("comment has no anchor"),
        };

        Ok(Self {
            id: record.id,
            content: record.content,
            persona_id: record.persona_id,
            persona_name: record.persona_name,
            persona_color: record.persona_color,
            anchor,
            document_id: record.document_id,
            version_hash: record.version_hash,
            created_at: record.created_at,
        })
    }
}

/// Severity of a merged finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaPriority {
    /// Must be addressed.
    Critical,
    /// Should be addressed.
    High,
    /// Worth addressing.
    Medium,
    /// Nice to have.
    Low,
}

/// One persona comment folded into a [`MetaComment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaCommentSource {
    /// Contributing persona.
    pub persona_id: String,
    /// Contributing persona display name.
    pub persona_name: String,
    /// Contributing persona display color.
    pub persona_color: String,
    /// The original comment text.
    pub original_content: String,
}

/// A finding merged across personas by the meta-review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaComment {
    /// Meta-comment identifier.
    pub id: String,
    /// Merged text.
    pub content: String,
    /// First anchored line.
    pub start_line: u32,
    /// Last anchored line.
    pub end_line: u32,
    /// Persona comments this finding was built from.
    #[serde(default)]
    pub sources: Vec<MetaCommentSource>,
    /// Category such as `structure`, `clarity` or `security`.
    pub category: String,
    /// Severity.
    pub priority: MetaPriority,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl MetaComment {
    /// The line range this finding is anchored to.
    #[must_use]
    pub const fn anchor(&self) -> LineAnchor {
        LineAnchor::new(self.start_line, self.end_line)
    }
}
