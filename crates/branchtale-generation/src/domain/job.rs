//! The generation job entity.

use branchtale_core::error::DomainError;
use branchtale_core::ids::{JobId, StoryId};
use branchtale_core::wire::JobStatus;
use chrono::{DateTime, Utc};

/// Default reason when the service reports failure without detail.
pub const DEFAULT_FAILURE_REASON: &str = "generation failed";

/// Which side of the boundary a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service reported the job as failed.
    Generation,
    /// The service could not be reached or answered unexpectedly.
    Transport,
}

/// Terminal failure of a job, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// Origin of the failure.
    pub kind: FailureKind,
    /// Reason suitable for display.
    pub reason: String,
}

impl JobFailure {
    /// A failure reported by the generation service.
    #[must_use]
    pub fn generation(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Generation,
            reason: reason.into(),
        }
    }

    /// A failure talking to the service.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            reason: reason.into(),
        }
    }
}

impl From<JobFailure> for DomainError {
    fn from(failure: JobFailure) -> Self {
        match failure.kind {
            FailureKind::Generation => Self::GenerationFailure(failure.reason),
            FailureKind::Transport => Self::Transport(failure.reason),
        }
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job produced a story.
    Completed(StoryId),
    /// The job failed.
    Failed(JobFailure),
    /// The job was discarded by a reset or a newer submission before it
    /// finished.
    Superseded,
}

/// One asynchronous request to generate a story from a theme.
///
/// Status only moves forward: once `Completed` or `Failed`, every further
/// transition is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    /// Identifier assigned by the service.
    pub id: JobId,
    /// Theme the job was submitted with.
    pub theme: String,
    /// Current status.
    pub status: JobStatus,
    /// Set once the job completed.
    pub result_story_id: Option<StoryId>,
    /// Set once the job failed.
    pub failure: Option<JobFailure>,
    /// When the create request was acknowledged.
    pub submitted_at: DateTime<Utc>,
    /// When the job reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    /// A freshly accepted job. Polling decides everything after this, so the
    /// job always starts out `Processing`.
    #[must_use]
    pub fn submitted(id: JobId, theme: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            theme: theme.into(),
            status: JobStatus::Processing,
            result_story_id: None,
            failure: None,
            submitted_at: now,
            completed_at: None,
        }
    }

    /// Whether the job has reached `Completed` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves the job to `Completed`. Returns `false` if already terminal.
    pub fn complete(&mut self, story_id: StoryId, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.result_story_id = Some(story_id);
        self.completed_at = Some(now);
        true
    }

    /// Moves the job to `Failed`. Returns `false` if already terminal.
    pub fn fail(&mut self, failure: JobFailure, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.failure = Some(failure);
        self.completed_at = Some(now);
        true
    }

    /// The failure reason, present only when `Failed`.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.reason.as_str())
    }

    /// The terminal outcome, or `None` while the job is still running.
    #[must_use]
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self.status {
            JobStatus::Completed => self.result_story_id.clone().map(JobOutcome::Completed),
            JobStatus::Failed => self.failure.clone().map(JobOutcome::Failed),
            JobStatus::Pending | JobStatus::Processing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtale_test_support::FixedClock;

    fn job() -> GenerationJob {
        GenerationJob::submitted(JobId::from("job-1"), "pirates", FixedClock::reference().0)
    }

    #[test]
    fn test_submitted_job_is_processing() {
        let job = job();

        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.outcome().is_none());
    }

    #[test]
    fn test_complete_records_story_and_timestamp() {
        // Arrange
        let now = FixedClock::reference().0;
        let mut job = job();

        // Act
        let changed = job.complete(StoryId::from("s1"), now);

        // Assert
        assert!(changed);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_at, Some(now));
        assert_eq!(job.outcome(), Some(JobOutcome::Completed(StoryId::from("s1"))));
    }

    #[test]
    fn test_terminal_job_refuses_further_transitions() {
        // Arrange
        let now = FixedClock::reference().0;
        let mut job = job();
        job.fail(JobFailure::generation("quota exceeded"), now);

        // Act
        let completed = job.complete(StoryId::from("s1"), now);
        let failed_again = job.fail(JobFailure::transport("boom"), now);

        // Assert
        assert!(!completed);
        assert!(!failed_again);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.failure_reason(), Some("quota exceeded"));
        assert!(job.result_story_id.is_none());
    }

    #[test]
    fn test_failure_maps_to_domain_error_by_kind() {
        assert_eq!(
            DomainError::from(JobFailure::generation("quota exceeded")),
            DomainError::GenerationFailure("quota exceeded".to_owned())
        );
        assert_eq!(
            DomainError::from(JobFailure::transport("connection refused")),
            DomainError::Transport("connection refused".to_owned())
        );
    }
}
