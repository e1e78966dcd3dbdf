//! Document records.
//!
//! Documents are versioned by the backend; this crate only carries the
//! identifiers and commit hashes it hands out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed version of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Commit hash identifying the version.
    pub commit_hash: String,
    /// Commit message.
    pub message: String,
    /// Commit author.
    pub author: String,
    /// Commit time.
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl DocumentVersion {
    /// The abbreviated hash shown in version pickers.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let end = self
            .commit_hash
            .char_indices()
            .nth(7)
            .map_or(self.commit_hash.len(), |(i, _)| i);
        &self.commit_hash[..end]
    }
}

/// A document as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current content, when the endpoint includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Backing repository path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
    /// Checked-out branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_branch: Option<String>,
    /// Whether the document is archived.
    #[serde(default)]
    pub is_archived: bool,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Version history, newest first.
    #[serde(default)]
    pub versions: Vec<DocumentVersion>,
}

impl Document {
    /// The newest version, if the history was included.
    #[must_use]
    pub fn latest_version(&self) -> Option<&DocumentVersion> {
        self.versions.first()
    }
}

/// Body of a create-document request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Title.
    pub title: String,
    /// Initial content.
    pub content: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewDocument {
    /// Create a request with a title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of an update-document request; the backend commits a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// New content.
    pub content: String,
    /// Commit message.
    pub message: String,
}

/// Document content at a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// The text.
    pub content: String,
    /// The requested version, `None` for the working head.
    #[serde(default)]
    pub version: Option<String>,
}

/// A unified diff between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDiff {
    /// Diff text.
    pub diff: String,
    /// Base version.
    #[serde(default)]
    pub from: Option<String>,
    /// Target version, `HEAD` when omitted in the request.
    #[serde(default)]
    pub to: Option<String>,
}
