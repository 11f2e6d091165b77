//! Session types shared by the turn loop and its frontends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::gateway::DEFAULT_MAX_STEPS;

/// Where the turn loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Waiting for the next user message
    AwaitingInput,
    /// User message recorded, model call in flight
    Dispatching,
    /// Forwarding answer fragments to the display
    Streaming,
    /// Answer recorded, turn complete
    Idle,
    /// Session over
    Closed,
}

/// One read from the input layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Line(String),
    /// Ctrl-C / Ctrl-D or any other abort from the terminal
    Cancelled,
}

impl UserInput {
    pub fn line(content: impl Into<String>) -> Self {
        Self::Line(content.into())
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed an exit keyword
    Exited,
    /// The input layer was cancelled
    Cancelled,
}

/// Configuration for creating a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory relative tool paths resolve against
    pub workspace_path: PathBuf,
    /// Bound on model calls per turn
    pub max_steps: usize,
    /// Message consumed as the first turn without prompting
    pub initial_message: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            workspace_path: std::env::current_dir().unwrap_or_default(),
            max_steps: DEFAULT_MAX_STEPS,
            initial_message: None,
        }
    }
}

impl SessionConfig {
    /// Create a new session config with the given workspace path
    pub fn new(workspace_path: impl Into<PathBuf>) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            ..Default::default()
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Seed the first turn. Blank messages are dropped.
    pub fn with_initial_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.initial_message = (!message.trim().is_empty()).then_some(message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_initial_message_dropped() {
        let config = SessionConfig::new("/tmp").with_initial_message("   ");
        assert!(config.initial_message.is_none());

        let config = SessionConfig::new("/tmp").with_initial_message("list files here");
        assert_eq!(config.initial_message.as_deref(), Some("list files here"));
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
    }
}
