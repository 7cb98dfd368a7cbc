// ⏳ Job Contract - what the extraction collaborator hands back
//
// Upstream extraction runs as an asynchronous job that somebody else polls.
// By the time a result reaches us it is one of three things: a payload, a
// failed job, or a poll that gave up. Nothing here polls.

use serde::{Deserialize, Serialize};

// ============================================================================
// STATUS & SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Last state observed by the polling collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot<T> {
    pub status: JobStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> JobSnapshot<T> {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Succeeded with a result → Ready; failed → Failed; anything else means
    /// the poller stopped before a usable result existed.
    pub fn into_outcome(self, job_id: &str) -> JobOutcome<T> {
        match (self.status, self.result) {
            (JobStatus::Succeeded, Some(result)) => JobOutcome::Ready(result),
            (JobStatus::Failed, _) => JobOutcome::Failed {
                job_id: job_id.to_string(),
            },
            _ => JobOutcome::TimedOut,
        }
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome<T> {
    Ready(T),
    Failed { job_id: String },
    TimedOut,
}

impl<T> JobOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, JobOutcome::Ready(_))
    }

    /// Message shown to the user when no payload is available
    pub fn user_message(&self) -> Option<String> {
        match self {
            JobOutcome::Ready(_) => None,
            JobOutcome::Failed { job_id } => Some(format!("Job {} failed", job_id)),
            JobOutcome::TimedOut => Some("Polling timed out".to_string()),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            JobOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
