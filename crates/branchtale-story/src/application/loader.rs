//! Fetches a complete story and turns it into a checked graph.

use branchtale_core::error::DomainError;
use branchtale_core::ids::StoryId;
use branchtale_core::service::{ServiceError, StoryService};
use tracing::{instrument, warn};

use crate::domain::graph::StoryGraph;

/// Loads story `story_id` from the service.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the service does not know the story.
/// Returns `DomainError::Transport` if the request fails otherwise.
/// Returns `DomainError::Integrity` if the story graph is not closed.
#[instrument(skip(service), fields(story_id = %story_id))]
pub async fn load_story(
    service: &dyn StoryService,
    story_id: &StoryId,
) -> Result<StoryGraph, DomainError> {
    let response = service.complete_story(story_id).await.map_err(|e| match e {
        ServiceError::NotFound(_) => {
            DomainError::NotFound(format!("Story with ID {story_id} was not found."))
        }
        ServiceError::Transport(message) => {
            DomainError::Transport(format!("Failed to load story: {message}"))
        }
    })?;
    StoryGraph::try_from(response).inspect_err(|e| {
        warn!(error = %e, "story graph rejected");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtale_core::ids::NodeId;
    use branchtale_test_support::{FailingStoryService, ScriptedStoryService, branching_story};

    #[tokio::test]
    async fn test_load_story_returns_graph() {
        // Arrange
        let service = ScriptedStoryService::new().with_story("s1", branching_story());

        // Act
        let graph = load_story(&service, &StoryId::from("s1")).await.unwrap();

        // Assert
        assert_eq!(graph.root_node_id(), &NodeId::from("A"));
        assert_eq!(service.fetched_stories(), vec![StoryId::from("s1")]);
    }

    #[tokio::test]
    async fn test_unknown_story_is_not_found() {
        let service = ScriptedStoryService::new();

        let err = load_story(&service, &StoryId::from("42")).await.unwrap_err();

        assert_eq!(
            err,
            DomainError::NotFound("Story with ID 42 was not found.".to_owned())
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_wrapped() {
        let err = load_story(&FailingStoryService, &StoryId::from("s1"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::Transport("Failed to load story: connection refused".to_owned())
        );
    }

    #[tokio::test]
    async fn test_broken_story_is_integrity_error() {
        // Arrange
        let mut story = branching_story();
        story.all_nodes.remove(&NodeId::from("B"));
        let service = ScriptedStoryService::new().with_story("s1", story);

        // Act
        let err = load_story(&service, &StoryId::from("s1")).await.unwrap_err();

        // Assert
        assert!(matches!(err, DomainError::Integrity(_)));
    }
}
