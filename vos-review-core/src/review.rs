//! Stored reviews and review jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a review or review job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not started.
    #[serde(alias = "queued")]
    Pending,
    /// In progress.
    Running,
    /// Finished.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Check if the job has stopped.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A stored review of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Review identifier.
    pub id: String,
    /// Reviewed document.
    pub document_id: String,
    /// Personas that took part.
    #[serde(default)]
    pub persona_ids: Vec<String>,
    /// Review status.
    pub status: JobStatus,
    /// Job that ran the review, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Completion time.
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A background review job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewJob {
    /// Job identifier.
    pub id: String,
    /// Reviewed document.
    pub document_id: String,
    /// Job status.
    pub status: JobStatus,
    /// LLM provider used.
    #[serde(default)]
    pub provider: Option<String>,
    /// Model used.
    #[serde(default)]
    pub model: Option<String>,
    /// What started the job, `manual` or `auto`.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Failure message for failed jobs.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Completion time.
    #[serde(default, with = "crate::timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_trigger() -> String {
    "manual".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserialize() {
        let json = r#"{
            "id": "j1",
            "document_id": "d1",
            "status": "queued",
            "provider": "anthropic",
            "created_at": "2024-01-01T00:00:00",
            "completed_at": null
        }"#;
        let job: ReviewJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.trigger, "manual");
        assert!(!job.status.is_finished());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_review_summary_deserialize() {
        let json = r#"{
            "id": "r1",
            "document_id": "d1",
            "persona_ids": ["security"],
            "status": "completed",
            "created_at": "2024-01-01T00:00:00Z",
            "completed_at": "2024-01-01T00:05:00Z"
        }"#;
        let review: ReviewSummary = serde_json::from_str(json).unwrap();
        assert!(review.status.is_finished());
        assert_eq!(review.persona_ids, vec!["security".to_string()]);
        assert!(review.completed_at.is_some());
    }
}
