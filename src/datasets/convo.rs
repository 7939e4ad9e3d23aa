//! Conversation records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One training example: an ordered list of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

/// Why a conversation cannot be trained on
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvoIssue {
    #[error("conversation has no messages")]
    Empty,

    #[error("system message at position {0} (only the first message may be a system prompt)")]
    MisplacedSystem(usize),

    #[error("conversation has no assistant message to learn from")]
    NoAssistant,

    #[error("message {index} ({role}) has empty content")]
    EmptyContent { index: usize, role: Role },
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Check the conversation is usable as a supervised example.
    pub fn validate(&self) -> Result<(), ConvoIssue> {
        if self.messages.is_empty() {
            return Err(ConvoIssue::Empty);
        }

        for (index, message) in self.messages.iter().enumerate() {
            if message.role == Role::System && index > 0 {
                return Err(ConvoIssue::MisplacedSystem(index));
            }
            if message.content.trim().is_empty() {
                return Err(ConvoIssue::EmptyContent {
                    index,
                    role: message.role,
                });
            }
        }

        if !self.messages.iter().any(|m| m.role == Role::Assistant) {
            return Err(ConvoIssue::NoAssistant);
        }

        Ok(())
    }

    /// Number of messages with the given role
    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}
