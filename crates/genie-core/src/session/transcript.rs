//! Conversation transcript
//!
//! An append-only, ordered history of role-tagged messages. Only the turn
//! loop writes to it, and only between turns.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only conversation history.
///
/// Invariants checked on [`append`](Self::append):
/// - user messages have non-blank content;
/// - an assistant message directly follows a user message.
///
/// Two user messages in a row are accepted: a turn whose model call failed
/// keeps its user message but gets no reply.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the transcript
    pub fn append(&mut self, message: Message) -> Result<()> {
        match message.role {
            Role::User if message.content.trim().is_empty() => {
                return Err(Error::Validation("user message is empty".to_string()));
            }
            Role::Assistant if self.last().map(|m| m.role) != Some(Role::User) => {
                return Err(Error::Validation(
                    "assistant message must follow a user message".to_string(),
                ));
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    /// The full history, oldest first
    pub fn as_context(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
