//! Conversation log
//!
//! An ordered, append-only list of chat turns that always starts with the
//! system turn. `reset` is the only operation that discards turns.

use serde::{Deserialize, Serialize};

/// Content of the leading system turn of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

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

/// Ordered turns of one session.
///
/// Never empty: construction seeds the system turn and there is no way to
/// remove it short of `reset`, which puts it straight back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Fresh conversation holding only the default system turn
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::system(DEFAULT_SYSTEM_PROMPT)],
        }
    }

    /// Discard everything and return to the initial single-turn state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
