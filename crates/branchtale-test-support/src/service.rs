//! Test services: fake `StoryService` implementations for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use branchtale_core::ids::{JobId, StoryId};
use branchtale_core::service::{ServiceError, StoryService};
use branchtale_core::wire::{
    CompleteStoryResponse, CreateJobRequest, CreateJobResponse, JobStatusResponse,
};
use tokio::sync::Semaphore;

use crate::fixtures::processing;

/// A service that answers from a script and records every call.
///
/// Each successful `create_job` assigns `job-1`, `job-2`, … in call order.
/// Poll responses are consumed in order; once the script is exhausted every
/// further poll reports `processing`. Stories are served from a fixed map
/// and unknown ids answer "not found".
#[derive(Debug, Default)]
pub struct ScriptedStoryService {
    create_error: Mutex<Option<ServiceError>>,
    polls: Mutex<VecDeque<Result<JobStatusResponse, ServiceError>>>,
    stories: Mutex<HashMap<StoryId, CompleteStoryResponse>>,
    created: Mutex<Vec<CreateJobRequest>>,
    polled: Mutex<Vec<JobId>>,
    fetched: Mutex<Vec<StoryId>>,
    poll_gate: Option<Arc<Semaphore>>,
}

impl ScriptedStoryService {
    /// Creates a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `create_job` call fail with `error`.
    #[must_use]
    pub fn with_create_error(self, error: ServiceError) -> Self {
        *self.create_error.lock().unwrap() = Some(error);
        self
    }

    /// Appends a poll result to the script.
    #[must_use]
    pub fn then_poll(self, result: Result<JobStatusResponse, ServiceError>) -> Self {
        self.polls.lock().unwrap().push_back(result);
        self
    }

    /// Serves `story` under `story_id`.
    #[must_use]
    pub fn with_story(self, story_id: &str, story: CompleteStoryResponse) -> Self {
        self.stories
            .lock()
            .unwrap()
            .insert(StoryId::from(story_id), story);
        self
    }

    /// Holds every poll after recording it until [`Self::release_polls`]
    /// lets it through.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.poll_gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `count` held polls complete.
    pub fn release_polls(&self, count: usize) {
        if let Some(gate) = &self.poll_gate {
            gate.add_permits(count);
        }
    }

    /// Snapshot of every create-job request received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn created_jobs(&self) -> Vec<CreateJobRequest> {
        self.created.lock().unwrap().clone()
    }

    /// Snapshot of the job id of every status request received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn polled_jobs(&self) -> Vec<JobId> {
        self.polled.lock().unwrap().clone()
    }

    /// Number of status requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn poll_count(&self) -> usize {
        self.polled.lock().unwrap().len()
    }

    /// Snapshot of every story id fetched.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fetched_stories(&self) -> Vec<StoryId> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryService for ScriptedStoryService {
    async fn create_job(
        &self,
        request: &CreateJobRequest,
    ) -> Result<CreateJobResponse, ServiceError> {
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(CreateJobResponse {
            job_id: JobId::new(format!("job-{}", created.len())),
            status: None,
        })
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ServiceError> {
        self.polled.lock().unwrap().push(job_id.clone());
        if let Some(gate) = &self.poll_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(processing()))
    }

    async fn complete_story(
        &self,
        story_id: &StoryId,
    ) -> Result<CompleteStoryResponse, ServiceError> {
        self.fetched.lock().unwrap().push(story_id.clone());
        self.stories
            .lock()
            .unwrap()
            .get(story_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("story {story_id}")))
    }
}

/// A service whose every call fails with a transport error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingStoryService;

#[async_trait]
impl StoryService for FailingStoryService {
    async fn create_job(
        &self,
        _request: &CreateJobRequest,
    ) -> Result<CreateJobResponse, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }

    async fn job_status(&self, _job_id: &JobId) -> Result<JobStatusResponse, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }

    async fn complete_story(
        &self,
        _story_id: &StoryId,
    ) -> Result<CompleteStoryResponse, ServiceError> {
        Err(ServiceError::Transport("connection refused".into()))
    }
}
