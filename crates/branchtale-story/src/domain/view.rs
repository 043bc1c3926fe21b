//! Read-only projection of the current decision point.

use branchtale_core::ids::NodeId;
use serde::Serialize;

use super::graph::{Choice, StoryNode};

/// What a reader sees at the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    /// The node under the cursor.
    pub node_id: NodeId,
    /// Its narrative text.
    pub content: String,
    /// Options to offer; always empty on an ending.
    pub options: Vec<Choice>,
    /// Whether the story is over.
    pub is_ending: bool,
    /// Whether the story was won. Never set unless `is_ending` is.
    pub is_winning_ending: bool,
}

impl From<&StoryNode> for NodeView {
    fn from(node: &StoryNode) -> Self {
        Self {
            node_id: node.id.clone(),
            content: node.content.clone(),
            options: node.offered().to_vec(),
            is_ending: node.is_ending,
            is_winning_ending: node.wins(),
        }
    }
}
