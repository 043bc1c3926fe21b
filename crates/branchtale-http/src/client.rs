//! REST client for the story generation service.

use async_trait::async_trait;
use branchtale_core::ids::{JobId, StoryId};
use branchtale_core::service::{ServiceError, StoryService};
use branchtale_core::wire::{
    CompleteStoryResponse, CreateJobRequest, CreateJobResponse, JobStatusResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Errors from the HTTP layer, before they are folded into [`ServiceError`].
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl HttpError {
    fn into_service_error(self, resource: impl FnOnce() -> String) -> ServiceError {
        match self {
            Self::Status { status: 404, .. } => ServiceError::NotFound(resource()),
            other => ServiceError::Transport(other.to_string()),
        }
    }
}

/// [`StoryService`] backed by the service's REST API.
#[derive(Debug, Clone)]
pub struct HttpStoryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStoryService {
    /// Creates a client for the service at `base_url`, e.g.
    /// `http://localhost:8000/api`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.client.get(self.url(path)).send().await?;
        debug!(status = response.status().as_u16(), "GET {path}");
        Self::parse(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        debug!(status = response.status().as_u16(), "POST {path}");
        Self::parse(response).await
    }
}

#[async_trait]
impl StoryService for HttpStoryService {
    #[instrument(skip_all, fields(theme = %request.theme))]
    async fn create_job(
        &self,
        request: &CreateJobRequest,
    ) -> Result<CreateJobResponse, ServiceError> {
        // A missing create endpoint is a transport failure, not an unknown job.
        self.post("/stories/create", request)
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))
    }

    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ServiceError> {
        self.get(&format!("/jobs/{job_id}"))
            .await
            .map_err(|e| e.into_service_error(|| format!("job {job_id}")))
    }

    #[instrument(skip_all, fields(story_id = %story_id))]
    async fn complete_story(
        &self,
        story_id: &StoryId,
    ) -> Result<CompleteStoryResponse, ServiceError> {
        self.get(&format!("/stories/{story_id}/complete"))
            .await
            .map_err(|e| e.into_service_error(|| format!("story {story_id}")))
    }
}
