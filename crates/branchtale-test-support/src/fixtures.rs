//! Canned service payloads.

use std::collections::HashMap;

use branchtale_core::ids::{NodeId, StoryId};
use branchtale_core::wire::{
    CompleteStoryResponse, JobStatus, JobStatusResponse, StoryNodeRecord, StoryOptionRecord,
};

fn status(status: JobStatus) -> JobStatusResponse {
    JobStatusResponse {
        job_id: None,
        status,
        story_id: None,
        error: None,
        created_at: None,
        completed_at: None,
    }
}

/// A poll response reporting the job as queued but not started.
#[must_use]
pub fn pending() -> JobStatusResponse {
    status(JobStatus::Pending)
}

/// A poll response reporting the job as still processing.
#[must_use]
pub fn processing() -> JobStatusResponse {
    status(JobStatus::Processing)
}

/// A poll response reporting completion with `story_id`.
#[must_use]
pub fn completed(story_id: &str) -> JobStatusResponse {
    JobStatusResponse {
        story_id: Some(StoryId::from(story_id)),
        ..status(JobStatus::Completed)
    }
}

/// A poll response reporting failure with `reason`.
#[must_use]
pub fn failed(reason: &str) -> JobStatusResponse {
    JobStatusResponse {
        error: Some(reason.to_owned()),
        ..status(JobStatus::Failed)
    }
}

/// A poll response reporting failure without any detail.
#[must_use]
pub fn failed_without_reason() -> JobStatusResponse {
    status(JobStatus::Failed)
}

fn node(id: &str, content: &str, options: &[(&str, &str)]) -> StoryNodeRecord {
    StoryNodeRecord {
        id: NodeId::from(id),
        content: content.to_owned(),
        is_ending: false,
        is_winning_ending: false,
        options: options
            .iter()
            .map(|(text, target)| StoryOptionRecord {
                text: (*text).to_owned(),
                node_id: Some(NodeId::from(*target)),
            })
            .collect(),
    }
}

fn ending(id: &str, content: &str, winning: bool) -> StoryNodeRecord {
    StoryNodeRecord {
        id: NodeId::from(id),
        content: content.to_owned(),
        is_ending: true,
        is_winning_ending: winning,
        options: Vec::new(),
    }
}

fn story(title: &str, root: &str, nodes: Vec<StoryNodeRecord>) -> CompleteStoryResponse {
    let all_nodes: HashMap<NodeId, StoryNodeRecord> =
        nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
    let root_node = all_nodes[&NodeId::from(root)].clone();
    CompleteStoryResponse {
        id: None,
        title: title.to_owned(),
        session_id: None,
        created_at: None,
        root_node,
        all_nodes,
    }
}

/// Root `A` offers `B` (winning ending) and `C` (losing ending).
#[must_use]
pub fn branching_story() -> CompleteStoryResponse {
    story(
        "The Pirate's Wager",
        "A",
        vec![
            node(
                "A",
                "A storm gathers over the cove.",
                &[("Sail into the storm", "B"), ("Hide in the caves", "C")],
            ),
            ending("B", "You find the hidden treasure.", true),
            ending("C", "The tide floods the caves.", false),
        ],
    )
}

/// `A → B → A` loop with an exit from `B` to the ending `E`.
#[must_use]
pub fn cyclic_story() -> CompleteStoryResponse {
    story(
        "The Endless Corridor",
        "A",
        vec![
            node("A", "A corridor.", &[("Walk on", "B")]),
            node(
                "B",
                "The same corridor again.",
                &[("Turn back", "A"), ("Open the door", "E")],
            ),
            ending("E", "Daylight.", true),
        ],
    )
}
