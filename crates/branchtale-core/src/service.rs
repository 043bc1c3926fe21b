//! The job/story service seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{JobId, StoryId};
use crate::wire::{CompleteStoryResponse, CreateJobRequest, CreateJobResponse, JobStatusResponse};

/// Transport-level failure talking to the service.
///
/// "Not found" is kept apart from every other failure: while polling it
/// means the job is not visible yet, which is not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service answered that the resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Any other failure: network, unexpected status, undecodable body.
    #[error("{0}")]
    Transport(String),
}

impl ServiceError {
    /// Whether this is the "not found" signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Client of the external job/story service.
#[async_trait]
pub trait StoryService: Send + Sync {
    /// Submits a new generation job.
    async fn create_job(
        &self,
        request: &CreateJobRequest,
    ) -> Result<CreateJobResponse, ServiceError>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ServiceError>;

    /// Fetches a completed story with all of its nodes.
    async fn complete_story(
        &self,
        story_id: &StoryId,
    ) -> Result<CompleteStoryResponse, ServiceError>;
}
