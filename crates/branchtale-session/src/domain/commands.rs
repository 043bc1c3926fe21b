//! Commands a caller issues against a play session.

use branchtale_core::command::Command;
use branchtale_core::ids::{NodeId, StoryId};
use uuid::Uuid;

/// Command to generate a story from a theme.
#[derive(Debug, Clone)]
pub struct SubmitTheme {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Theme to generate a story around.
    pub theme: String,
}

impl SubmitTheme {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            theme: theme.into(),
        }
    }
}

impl Command for SubmitTheme {
    fn command_type(&self) -> &'static str {
        "play.submit_theme"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to play an already generated story.
#[derive(Debug, Clone)]
pub struct OpenStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to open.
    pub story_id: StoryId,
}

impl OpenStory {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(story_id: impl Into<StoryId>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            story_id: story_id.into(),
        }
    }
}

impl Command for OpenStory {
    fn command_type(&self) -> &'static str {
        "play.open_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to follow one of the current node's options.
#[derive(Debug, Clone)]
pub struct ChooseOption {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target of the chosen option.
    pub node_id: NodeId,
}

impl ChooseOption {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            node_id: node_id.into(),
        }
    }
}

impl Command for ChooseOption {
    fn command_type(&self) -> &'static str {
        "play.choose_option"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to go back to the first node of the story.
#[derive(Debug, Clone)]
pub struct RestartStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Default for RestartStory {
    fn default() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Command for RestartStory {
    fn command_type(&self) -> &'static str {
        "play.restart_story"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to discard everything and return to idle.
#[derive(Debug, Clone)]
pub struct ResetSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Default for ResetSession {
    fn default() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Command for ResetSession {
    fn command_type(&self) -> &'static str {
        "play.reset_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
