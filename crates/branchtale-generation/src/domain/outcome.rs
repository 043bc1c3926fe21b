//! Classification of status responses and the result of applying them.

use branchtale_core::ids::StoryId;
use branchtale_core::service::ServiceError;
use branchtale_core::wire::{JobStatus, JobStatusResponse};

use super::job::{DEFAULT_FAILURE_REASON, JobFailure};

const COMPLETED_WITHOUT_STORY: &str = "generation completed without a story";

/// What a single status request said, before it is applied to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSignal {
    /// Still pending or processing, no error.
    InProgress(JobStatus),
    /// Completed with a story.
    Completed(StoryId),
    /// Failed, or an error was reported.
    Failed(String),
    /// The service does not know the job yet.
    NotFound,
    /// Any other transport failure.
    Transport(String),
}

/// Classifies the result of one status request.
///
/// A completed job with a story wins over a stray error field. An error
/// field on an otherwise running job fails it. Blank errors count as absent.
#[must_use]
pub fn classify(result: Result<JobStatusResponse, ServiceError>) -> PollSignal {
    let response = match result {
        Ok(response) => response,
        Err(ServiceError::NotFound(_)) => return PollSignal::NotFound,
        Err(ServiceError::Transport(message)) => return PollSignal::Transport(message),
    };

    let error = response.error.filter(|e| !e.trim().is_empty());

    match (response.status, response.story_id, error) {
        (JobStatus::Completed, Some(story_id), _) => PollSignal::Completed(story_id),
        (JobStatus::Completed, None, error) => {
            PollSignal::Failed(error.unwrap_or_else(|| COMPLETED_WITHOUT_STORY.to_owned()))
        }
        (JobStatus::Failed, _, error) => {
            PollSignal::Failed(error.unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_owned()))
        }
        (_, _, Some(error)) => PollSignal::Failed(error),
        (status, _, None) => PollSignal::InProgress(status),
    }
}

/// What applying one poll did to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No state change; polling continues.
    InProgress,
    /// Job not visible yet; no state change, polling continues.
    NotYetVisible,
    /// A transport failure was absorbed by the retry budget.
    TransportRetry {
        /// Consecutive transport failures so far.
        failures: u32,
    },
    /// The job completed with this story.
    Completed(StoryId),
    /// The job failed.
    Failed(JobFailure),
    /// The result belonged to a job that is no longer tracked, or that had
    /// already finished; it was discarded.
    Stale,
}

impl PollOutcome {
    /// Whether the schedule must stop after this outcome.
    #[must_use]
    pub fn stops_polling(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_) | Self::Stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtale_test_support::{completed, failed, failed_without_reason, pending, processing};

    #[test]
    fn test_processing_is_in_progress() {
        assert_eq!(
            classify(Ok(processing())),
            PollSignal::InProgress(JobStatus::Processing)
        );
    }

    #[test]
    fn test_pending_is_in_progress() {
        assert_eq!(
            classify(Ok(pending())),
            PollSignal::InProgress(JobStatus::Pending)
        );
    }

    #[test]
    fn test_completed_with_story_id() {
        assert_eq!(
            classify(Ok(completed("s1"))),
            PollSignal::Completed(StoryId::from("s1"))
        );
    }

    #[test]
    fn test_completed_without_story_id_fails() {
        let mut response = completed("s1");
        response.story_id = None;

        assert_eq!(
            classify(Ok(response)),
            PollSignal::Failed(COMPLETED_WITHOUT_STORY.to_owned())
        );
    }

    #[test]
    fn test_failed_carries_reason() {
        assert_eq!(
            classify(Ok(failed("quota exceeded"))),
            PollSignal::Failed("quota exceeded".to_owned())
        );
    }

    #[test]
    fn test_failed_without_reason_uses_default() {
        assert_eq!(
            classify(Ok(failed_without_reason())),
            PollSignal::Failed(DEFAULT_FAILURE_REASON.to_owned())
        );
    }

    #[test]
    fn test_error_field_fails_running_job() {
        let mut response = processing();
        response.error = Some("model overloaded".to_owned());

        assert_eq!(
            classify(Ok(response)),
            PollSignal::Failed("model overloaded".to_owned())
        );
    }

    #[test]
    fn test_blank_error_field_is_ignored() {
        let mut response = processing();
        response.error = Some("  ".to_owned());

        assert_eq!(
            classify(Ok(response)),
            PollSignal::InProgress(JobStatus::Processing)
        );
    }

    #[test]
    fn test_not_found_is_distinct_from_transport() {
        assert_eq!(
            classify(Err(ServiceError::NotFound("job job-1".to_owned()))),
            PollSignal::NotFound
        );
        assert_eq!(
            classify(Err(ServiceError::Transport("HTTP 500".to_owned()))),
            PollSignal::Transport("HTTP 500".to_owned())
        );
    }

    #[test]
    fn test_terminal_outcomes_stop_polling() {
        assert!(PollOutcome::Completed(StoryId::from("s1")).stops_polling());
        assert!(PollOutcome::Failed(JobFailure::generation("x")).stops_polling());
        assert!(PollOutcome::Stale.stops_polling());
        assert!(!PollOutcome::InProgress.stops_polling());
        assert!(!PollOutcome::NotYetVisible.stops_polling());
        assert!(!PollOutcome::TransportRetry { failures: 1 }.stops_polling());
    }
}
