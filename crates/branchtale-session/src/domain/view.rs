//! Serializable projection of a play session.

use branchtale_core::ids::{JobId, StoryId};
use branchtale_core::wire::JobStatus;
use branchtale_generation::application::snapshot::JobSnapshot;
use branchtale_story::domain::view::NodeView;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Where a play session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing submitted or opened.
    Idle,
    /// A generation job is being polled.
    Generating,
    /// A story is loaded.
    Playing,
    /// Generation or loading failed; only a reset or a new submission moves
    /// on from here.
    Failed,
}

/// The generation job as seen by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    /// Service-assigned id.
    pub job_id: JobId,
    /// Submitted theme.
    pub theme: String,
    /// Current status.
    pub status: JobStatus,
    /// Status requests issued so far.
    pub polls_issued: u32,
    /// Set once completed.
    pub story_id: Option<StoryId>,
    /// Set once failed.
    pub failure_reason: Option<String>,
    /// When the job was accepted.
    pub submitted_at: DateTime<Utc>,
    /// When the job reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobView {
    /// Projects the tracked job of `snapshot`, if any.
    #[must_use]
    pub fn from_snapshot(snapshot: &JobSnapshot) -> Option<Self> {
        snapshot.job.as_ref().map(|job| Self {
            job_id: job.id.clone(),
            theme: job.theme.clone(),
            status: job.status,
            polls_issued: snapshot.polls_issued,
            story_id: job.result_story_id.clone(),
            failure_reason: job.failure_reason().map(str::to_owned),
            submitted_at: job.submitted_at,
            completed_at: job.completed_at,
        })
    }
}

/// Everything a front end needs to render a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Session identifier.
    pub session_id: Uuid,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// The generation job, while one is tracked.
    pub job: Option<JobView>,
    /// Story being played.
    pub story_id: Option<StoryId>,
    /// Title of the story being played.
    pub title: Option<String>,
    /// Current decision point, while playing.
    pub node: Option<NodeView>,
    /// Why the session failed.
    pub failure: Option<String>,
}
