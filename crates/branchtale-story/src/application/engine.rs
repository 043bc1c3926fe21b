//! Traversal of a loaded story.

use branchtale_core::error::DomainError;
use branchtale_core::ids::NodeId;
use tracing::{debug, info};

use crate::domain::graph::{StoryGraph, StoryNode};
use crate::domain::view::NodeView;

#[derive(Debug)]
struct Loaded {
    graph: StoryGraph,
    cursor: NodeId,
}

impl Loaded {
    fn current(&self) -> Result<&StoryNode, DomainError> {
        self.graph.node(&self.cursor).ok_or_else(|| {
            DomainError::Integrity(format!("cursor points at missing node {}", self.cursor))
        })
    }
}

/// Holds one story graph and the reader's position in it.
///
/// Lookups are keyed; the engine only ever touches the current node and the
/// targets its options name.
#[derive(Debug, Default)]
pub struct StoryEngine {
    loaded: Option<Loaded>,
}

fn not_loaded() -> DomainError {
    DomainError::Validation("no story loaded".to_owned())
}

impl StoryEngine {
    /// An engine with no story.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `graph` and places the cursor on its root, replacing any story
    /// loaded before.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Integrity` if the root node is missing; the
    /// engine is left unchanged.
    pub fn load(&mut self, graph: StoryGraph) -> Result<NodeView, DomainError> {
        let root = graph.root_node_id().clone();
        let view = graph
            .node(&root)
            .map(NodeView::from)
            .ok_or_else(|| DomainError::Integrity(format!("root node {root} is missing")))?;
        info!(title = graph.title(), nodes = graph.node_count(), root = %root, "story loaded");
        self.loaded = Some(Loaded {
            graph,
            cursor: root,
        });
        Ok(view)
    }

    /// Whether a story is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Title of the loaded story.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.graph.title())
    }

    /// Id of the node under the cursor.
    #[must_use]
    pub fn current_node_id(&self) -> Option<&NodeId> {
        self.loaded.as_ref().map(|l| &l.cursor)
    }

    /// Projection of the node under the cursor, or `None` with no story.
    #[must_use]
    pub fn current_view(&self) -> Option<NodeView> {
        self.loaded
            .as_ref()
            .and_then(|l| l.current().ok())
            .map(NodeView::from)
    }

    /// Follows the option leading to `next_node_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` with no story loaded.
    /// Returns `DomainError::Integrity` if the current node is an ending or
    /// does not offer `next_node_id`; the cursor does not move.
    pub fn choose(&mut self, next_node_id: &NodeId) -> Result<NodeView, DomainError> {
        let loaded = self.loaded.as_mut().ok_or_else(not_loaded)?;
        let current = loaded.current()?;
        if current.is_ending {
            return Err(DomainError::Integrity(format!(
                "node {} is an ending and offers no choices",
                current.id
            )));
        }
        if !current.offers(next_node_id) {
            return Err(DomainError::Integrity(format!(
                "node {next_node_id} is not offered from node {}",
                current.id
            )));
        }
        let next = loaded.graph.node(next_node_id).ok_or_else(|| {
            DomainError::Integrity(format!("option targets missing node {next_node_id}"))
        })?;
        let view = NodeView::from(next);
        debug!(from = %loaded.cursor, to = %next_node_id, ending = view.is_ending, "choice taken");
        loaded.cursor = next_node_id.clone();
        Ok(view)
    }

    /// Moves the cursor back to the root.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` with no story loaded.
    pub fn restart(&mut self) -> Result<NodeView, DomainError> {
        let loaded = self.loaded.as_mut().ok_or_else(not_loaded)?;
        loaded.cursor = loaded.graph.root_node_id().clone();
        debug!(root = %loaded.cursor, "story restarted");
        loaded.current().map(NodeView::from)
    }

    /// Drops the loaded story.
    pub fn unload(&mut self) {
        if self.loaded.take().is_some() {
            debug!("story unloaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::Choice;
    use branchtale_test_support::{branching_story, cyclic_story};

    fn engine_with(story: branchtale_core::wire::CompleteStoryResponse) -> StoryEngine {
        let mut engine = StoryEngine::new();
        engine.load(StoryGraph::try_from(story).unwrap()).unwrap();
        engine
    }

    #[test]
    fn test_load_places_cursor_on_root() {
        // Act
        let engine = engine_with(branching_story());

        // Assert
        let view = engine.current_view().unwrap();
        assert_eq!(view.node_id, NodeId::from("A"));
        assert_eq!(view.options.len(), 2);
        assert!(!view.is_ending);
        assert_eq!(engine.title(), Some("The Pirate's Wager"));
    }

    #[test]
    fn test_choose_reaches_winning_ending() {
        // Arrange
        let mut engine = engine_with(branching_story());

        // Act
        let view = engine.choose(&NodeId::from("B")).unwrap();

        // Assert
        assert!(view.is_ending);
        assert!(view.is_winning_ending);
        assert!(view.options.is_empty());
        assert_eq!(engine.current_view(), Some(view));
    }

    #[test]
    fn test_choose_reaches_losing_ending() {
        let mut engine = engine_with(branching_story());

        let view = engine.choose(&NodeId::from("C")).unwrap();

        assert!(view.is_ending);
        assert!(!view.is_winning_ending);
    }

    #[test]
    fn test_choose_on_ending_is_rejected() {
        // Arrange
        let mut engine = engine_with(branching_story());
        engine.choose(&NodeId::from("B")).unwrap();

        // Act
        let err = engine.choose(&NodeId::from("C")).unwrap_err();

        // Assert
        assert_eq!(
            err,
            DomainError::Integrity("node B is an ending and offers no choices".to_owned())
        );
        assert_eq!(engine.current_node_id(), Some(&NodeId::from("B")));
    }

    #[test]
    fn test_choose_unoffered_node_keeps_cursor() {
        // Arrange
        let mut engine = engine_with(cyclic_story());

        // Act
        let err = engine.choose(&NodeId::from("E")).unwrap_err();

        // Assert
        assert_eq!(
            err,
            DomainError::Integrity("node E is not offered from node A".to_owned())
        );
        assert_eq!(engine.current_node_id(), Some(&NodeId::from("A")));
    }

    #[test]
    fn test_cycle_can_be_walked_repeatedly() {
        // Arrange
        let mut engine = engine_with(cyclic_story());

        // Act
        for _ in 0..3 {
            engine.choose(&NodeId::from("B")).unwrap();
            engine.choose(&NodeId::from("A")).unwrap();
        }
        engine.choose(&NodeId::from("B")).unwrap();
        let view = engine.choose(&NodeId::from("E")).unwrap();

        // Assert
        assert!(view.is_winning_ending);
    }

    #[test]
    fn test_restart_returns_to_root() {
        // Arrange
        let mut engine = engine_with(branching_story());
        engine.choose(&NodeId::from("C")).unwrap();

        // Act
        let view = engine.restart().unwrap();

        // Assert
        assert_eq!(view.node_id, NodeId::from("A"));
        assert_eq!(
            view.options,
            vec![
                Choice::new("Sail into the storm", "B"),
                Choice::new("Hide in the caves", "C"),
            ]
        );
    }

    #[test]
    fn test_restart_after_winning_ending_allows_other_branch() {
        // Arrange
        let mut engine = engine_with(branching_story());

        // Act
        let won = engine.choose(&NodeId::from("B")).unwrap();
        let root = engine.restart().unwrap();
        let lost = engine.choose(&NodeId::from("C")).unwrap();

        // Assert
        assert!(won.is_ending && won.is_winning_ending);
        assert_eq!(root.node_id, NodeId::from("A"));
        assert_eq!(lost.node_id, NodeId::from("C"));
        assert!(lost.is_ending);
        assert!(!lost.is_winning_ending);
    }

    #[test]
    fn test_restart_from_inside_cycle_returns_to_root() {
        // Arrange
        let mut engine = engine_with(cyclic_story());
        for _ in 0..2 {
            engine.choose(&NodeId::from("B")).unwrap();
            engine.choose(&NodeId::from("A")).unwrap();
        }
        engine.choose(&NodeId::from("B")).unwrap();

        // Act
        let view = engine.restart().unwrap();

        // Assert
        assert_eq!(view.node_id, NodeId::from("A"));
        assert_eq!(engine.current_node_id(), Some(&NodeId::from("A")));
        assert_eq!(view.options, vec![Choice::new("Walk on", "B")]);
    }

    #[test]
    fn test_operations_without_story_fail_validation() {
        let mut engine = StoryEngine::new();

        assert!(engine.current_view().is_none());
        assert!(matches!(
            engine.choose(&NodeId::from("A")),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(engine.restart(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_unload_clears_story() {
        let mut engine = engine_with(branching_story());

        engine.unload();

        assert!(!engine.is_loaded());
        assert!(engine.title().is_none());
    }
}
