//! Request and response bodies exchanged with the job/story service.
//!
//! Field names follow the service (snake_case). The camelCase spellings are
//! accepted as aliases.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{JobId, NodeId, StoryId};

/// Lifecycle status of a generation job as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not started.
    Pending,
    /// Generation in progress.
    Processing,
    /// Generation finished and a story exists.
    Completed,
    /// Generation failed.
    Failed,
}

impl JobStatus {
    /// Whether no further transition is possible for this job.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Body of the create-job request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Theme the story should be generated around.
    pub theme: String,
}

/// Response to the create-job request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    /// Identifier assigned to the new job.
    #[serde(alias = "jobId")]
    pub job_id: JobId,
    /// Initial status; absent means processing.
    #[serde(default)]
    pub status: Option<JobStatus>,
}

impl CreateJobResponse {
    /// The initial status, defaulting to `Processing` when the service
    /// omitted it.
    #[must_use]
    pub fn initial_status(&self) -> JobStatus {
        self.status.unwrap_or(JobStatus::Processing)
    }
}

/// Response to a job status request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Echo of the job identifier.
    #[serde(default, alias = "jobId")]
    pub job_id: Option<JobId>,
    /// Current status.
    pub status: JobStatus,
    /// Present once the job has completed.
    #[serde(default, alias = "storyId")]
    pub story_id: Option<StoryId>,
    /// Failure detail, if the service recorded one.
    #[serde(default)]
    pub error: Option<String>,
    /// Service-side creation timestamp, carried through untouched.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Service-side completion timestamp, carried through untouched.
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// A choice as stored by the service. The target may be null when the
/// generator produced a dangling branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOptionRecord {
    /// Display label.
    pub text: String,
    /// Target node.
    #[serde(default, alias = "nextNodeId")]
    pub node_id: Option<NodeId>,
}

/// A story node as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNodeRecord {
    /// Node identifier.
    pub id: NodeId,
    /// Narrative text.
    pub content: String,
    /// Terminal node flag.
    #[serde(default, alias = "isEnding")]
    pub is_ending: bool,
    /// Winning flag, meaningful only on endings.
    #[serde(default, alias = "isWinningEnding")]
    pub is_winning_ending: bool,
    /// Ordered choices.
    #[serde(default)]
    pub options: Vec<StoryOptionRecord>,
}

/// Response of the complete-story request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStoryResponse {
    /// Story identifier.
    #[serde(default)]
    pub id: Option<StoryId>,
    /// Display title.
    pub title: String,
    /// Service-side session that created the story.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Service-side creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Entry node.
    #[serde(alias = "rootNode")]
    pub root_node: StoryNodeRecord,
    /// Every node of the story keyed by id.
    #[serde(alias = "allNodes")]
    pub all_nodes: HashMap<NodeId, StoryNodeRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_response_without_status_defaults_to_processing() {
        let response: CreateJobResponse =
            serde_json::from_value(serde_json::json!({ "job_id": "abc" })).unwrap();

        assert_eq!(response.initial_status(), JobStatus::Processing);
    }

    #[test]
    fn test_job_status_response_accepts_service_payload() {
        let payload = serde_json::json!({
            "job_id": "0b8f6c1e-2a4d-4d8e-9d43-7c1f1e2b3a4c",
            "status": "completed",
            "created_at": "2026-01-15T10:00:00.123456+00:00",
            "completed_at": null,
            "story_id": 17,
            "error": null
        });

        let response: JobStatusResponse = serde_json::from_value(payload).unwrap();

        assert_eq!(response.status, JobStatus::Completed);
        assert_eq!(response.story_id, Some(StoryId::from(17)));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<JobStatusResponse, _> =
            serde_json::from_value(serde_json::json!({ "status": "exploded" }));

        assert!(result.is_err());
    }

    #[test]
    fn test_complete_story_accepts_service_payload() {
        let payload = serde_json::json!({
            "id": 3,
            "title": "The Drowned Bell",
            "session_id": "s-1",
            "created_at": "2026-01-15T10:00:00+00:00",
            "root_node": {
                "id": 1, "content": "Start", "is_ending": false, "is_winning_ending": false,
                "options": [{ "text": "Dive", "node_id": 2 }], "children": {}
            },
            "all_nodes": {
                "1": {
                    "id": 1, "content": "Start", "is_ending": false, "is_winning_ending": false,
                    "options": [{ "text": "Dive", "node_id": 2 }], "children": {}
                },
                "2": {
                    "id": 2, "content": "Treasure", "is_ending": true, "is_winning_ending": true,
                    "options": [], "children": {}
                }
            }
        });

        let story: CompleteStoryResponse = serde_json::from_value(payload).unwrap();

        assert_eq!(story.root_node.id, NodeId::from("1"));
        assert_eq!(story.all_nodes.len(), 2);
        assert_eq!(
            story.all_nodes[&NodeId::from("1")].options[0].node_id,
            Some(NodeId::from("2"))
        );
    }

    #[test]
    fn test_null_option_target_deserializes_as_none() {
        let option: StoryOptionRecord =
            serde_json::from_value(serde_json::json!({ "text": "Run", "node_id": null })).unwrap();

        assert!(option.node_id.is_none());
    }
}
