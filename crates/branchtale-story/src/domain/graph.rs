//! The story graph.
//!
//! A graph is only ever constructed through [`StoryGraph::new`] or the
//! conversion from the service's complete-story payload, and both check the
//! closure invariant: the root exists, every option target exists, and every
//! non-ending node offers at least one option. Cycles are allowed.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use branchtale_core::error::DomainError;
use branchtale_core::ids::NodeId;
use branchtale_core::wire::{CompleteStoryResponse, StoryNodeRecord};
use serde::Serialize;

/// One option offered by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Display label.
    pub text: String,
    /// Node the option leads to.
    pub next_node_id: NodeId,
}

impl Choice {
    /// Creates a choice.
    #[must_use]
    pub fn new(text: impl Into<String>, next_node_id: impl Into<NodeId>) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
        }
    }
}

/// A single passage of the story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryNode {
    /// Unique within the graph.
    pub id: NodeId,
    /// Narrative text.
    pub content: String,
    /// Terminal node.
    pub is_ending: bool,
    /// Only meaningful when `is_ending` is set.
    pub is_winning_ending: bool,
    /// Ordered options; empty on endings.
    pub options: Vec<Choice>,
}

impl StoryNode {
    /// A non-ending node offering `options`.
    #[must_use]
    pub fn passage(id: impl Into<NodeId>, content: impl Into<String>, options: Vec<Choice>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            is_ending: false,
            is_winning_ending: false,
            options,
        }
    }

    /// An ending node.
    #[must_use]
    pub fn ending(id: impl Into<NodeId>, content: impl Into<String>, winning: bool) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            is_ending: true,
            is_winning_ending: winning,
            options: Vec::new(),
        }
    }

    /// Whether this node is a winning ending. Always `false` for a node
    /// that is not an ending, whatever the stored flag says.
    #[must_use]
    pub fn wins(&self) -> bool {
        self.is_ending && self.is_winning_ending
    }

    /// Options a reader may pick from. Endings offer none.
    #[must_use]
    pub fn offered(&self) -> &[Choice] {
        if self.is_ending { &[] } else { &self.options }
    }

    /// Whether `target` is one of the options offered here.
    #[must_use]
    pub fn offers(&self, target: &NodeId) -> bool {
        self.offered().iter().any(|choice| &choice.next_node_id == target)
    }
}

/// An immutable, closed story graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryGraph {
    title: String,
    root_node_id: NodeId,
    nodes: HashMap<NodeId, StoryNode>,
}

impl StoryGraph {
    /// Builds a graph from its nodes and checks it.
    ///
    /// Options carried by ending nodes are dropped.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Integrity` if two nodes share an id, or if the
    /// graph is not closed.
    pub fn new(
        title: impl Into<String>,
        root_node_id: impl Into<NodeId>,
        nodes: impl IntoIterator<Item = StoryNode>,
    ) -> Result<Self, DomainError> {
        let mut map = HashMap::new();
        for mut node in nodes {
            if node.is_ending {
                node.options.clear();
            }
            match map.entry(node.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(DomainError::Integrity(format!(
                        "duplicate node {}",
                        node.id
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
        }

        let graph = Self {
            title: title.into(),
            root_node_id: root_node_id.into(),
            nodes: map,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Entry node id.
    #[must_use]
    pub fn root_node_id(&self) -> &NodeId {
        &self.root_node_id
    }

    /// Direct lookup by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&StoryNode> {
        self.nodes.get(id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if !self.nodes.contains_key(&self.root_node_id) {
            return Err(DomainError::Integrity(format!(
                "root node {} is missing",
                self.root_node_id
            )));
        }
        for node in self.nodes.values() {
            if node.is_ending {
                continue;
            }
            if node.options.is_empty() {
                return Err(DomainError::Integrity(format!(
                    "node {} is not an ending but offers no options",
                    node.id
                )));
            }
            if let Some(choice) = node
                .options
                .iter()
                .find(|choice| !self.nodes.contains_key(&choice.next_node_id))
            {
                return Err(DomainError::Integrity(format!(
                    "option \"{}\" of node {} targets missing node {}",
                    choice.text, node.id, choice.next_node_id
                )));
            }
        }
        Ok(())
    }
}

fn node_from_record(key: NodeId, record: StoryNodeRecord) -> Result<StoryNode, DomainError> {
    if key != record.id {
        return Err(DomainError::Integrity(format!(
            "node stored under {key} has id {}",
            record.id
        )));
    }
    let options = if record.is_ending {
        Vec::new()
    } else {
        record
            .options
            .into_iter()
            .map(|option| match option.node_id {
                Some(target) => Ok(Choice::new(option.text, target)),
                None => Err(DomainError::Integrity(format!(
                    "option \"{}\" of node {} has no target",
                    option.text, record.id
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(StoryNode {
        id: record.id,
        content: record.content,
        is_ending: record.is_ending,
        is_winning_ending: record.is_winning_ending,
        options,
    })
}

impl TryFrom<CompleteStoryResponse> for StoryGraph {
    type Error = DomainError;

    fn try_from(response: CompleteStoryResponse) -> Result<Self, Self::Error> {
        let nodes = response
            .all_nodes
            .into_iter()
            .map(|(key, record)| node_from_record(key, record))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(response.title, response.root_node.id, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchtale_core::wire::StoryOptionRecord;
    use branchtale_test_support::{branching_story, cyclic_story};

    #[test]
    fn test_branching_story_converts() {
        // Act
        let graph = StoryGraph::try_from(branching_story()).unwrap();

        // Assert
        assert_eq!(graph.title(), "The Pirate's Wager");
        assert_eq!(graph.root_node_id(), &NodeId::from("A"));
        assert_eq!(graph.node_count(), 3);
        let root = graph.node(&NodeId::from("A")).unwrap();
        assert_eq!(
            root.options,
            vec![
                Choice::new("Sail into the storm", "B"),
                Choice::new("Hide in the caves", "C"),
            ]
        );
    }

    #[test]
    fn test_cycles_are_accepted() {
        let graph = StoryGraph::try_from(cyclic_story()).unwrap();

        assert!(graph.node(&NodeId::from("B")).unwrap().offers(&NodeId::from("A")));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        // Arrange
        let mut story = branching_story();
        story.all_nodes.remove(&NodeId::from("A"));

        // Act
        let err = StoryGraph::try_from(story).unwrap_err();

        // Assert
        assert_eq!(err, DomainError::Integrity("root node A is missing".to_owned()));
    }

    #[test]
    fn test_dangling_target_is_rejected() {
        // Arrange
        let mut story = branching_story();
        story.all_nodes.remove(&NodeId::from("C"));

        // Act
        let err = StoryGraph::try_from(story).unwrap_err();

        // Assert
        assert_eq!(
            err,
            DomainError::Integrity(
                "option \"Hide in the caves\" of node A targets missing node C".to_owned()
            )
        );
    }

    #[test]
    fn test_null_target_is_rejected() {
        // Arrange
        let mut story = branching_story();
        let root = story.all_nodes.get_mut(&NodeId::from("A")).unwrap();
        root.options.push(StoryOptionRecord {
            text: "Jump overboard".to_owned(),
            node_id: None,
        });

        // Act
        let err = StoryGraph::try_from(story).unwrap_err();

        // Assert
        assert!(matches!(err, DomainError::Integrity(reason) if reason.contains("has no target")));
    }

    #[test]
    fn test_non_ending_without_options_is_rejected() {
        let err = StoryGraph::new("Stub", "A", [StoryNode::passage("A", "Nothing here.", vec![])])
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::Integrity("node A is not an ending but offers no options".to_owned())
        );
    }

    #[test]
    fn test_key_mismatch_is_rejected() {
        // Arrange
        let mut story = branching_story();
        let node = story.all_nodes.remove(&NodeId::from("C")).unwrap();
        story.all_nodes.insert(NodeId::from("Z"), node);

        // Act
        let err = StoryGraph::try_from(story).unwrap_err();

        // Assert
        assert_eq!(err, DomainError::Integrity("node stored under Z has id C".to_owned()));
    }

    #[test]
    fn test_duplicate_node_is_rejected() {
        let err = StoryGraph::new(
            "Twice",
            "A",
            [StoryNode::ending("A", "One.", true), StoryNode::ending("A", "Two.", false)],
        )
        .unwrap_err();

        assert_eq!(err, DomainError::Integrity("duplicate node A".to_owned()));
    }

    #[test]
    fn test_ending_options_are_dropped() {
        // Arrange
        let mut ending = StoryNode::ending("B", "The end.", false);
        ending.options.push(Choice::new("Nowhere", "missing"));

        // Act
        let graph = StoryGraph::new(
            "Short",
            "A",
            [StoryNode::passage("A", "Start.", vec![Choice::new("Go", "B")]), ending],
        )
        .unwrap();

        // Assert
        assert!(graph.node(&NodeId::from("B")).unwrap().options.is_empty());
    }

    #[test]
    fn test_integer_ids_resolve_string_keys() {
        // Arrange
        let payload = serde_json::json!({
            "title": "Numbers",
            "root_node": {"id": 1, "content": "Start.", "options": [{"text": "On", "node_id": 2}]},
            "all_nodes": {
                "1": {"id": 1, "content": "Start.", "options": [{"text": "On", "node_id": 2}]},
                "2": {"id": 2, "content": "End.", "is_ending": true, "is_winning_ending": true}
            }
        });
        let story: CompleteStoryResponse = serde_json::from_value(payload).unwrap();

        // Act
        let graph = StoryGraph::try_from(story).unwrap();

        // Assert
        assert!(graph.node(&NodeId::from("1")).unwrap().offers(&NodeId::from("2")));
        assert!(graph.node(&NodeId::from(2)).unwrap().wins());
    }

    #[test]
    fn test_winning_flag_ignored_on_non_ending() {
        let mut node = StoryNode::passage("A", "Start.", vec![Choice::new("Go", "B")]);
        node.is_winning_ending = true;

        assert!(!node.wins());
    }
}
