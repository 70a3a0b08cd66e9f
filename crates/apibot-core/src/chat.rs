//! Chat context: the ordered, append-only turn history of one session.
//!
//! A `ChatContext` is owned by exactly one session; nothing in here is
//! shared or locked. The router and agents read snapshots via
//! [`ChatContext::history`] and the session appends after each turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Who produced a turn.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when history is rendered into a prompt.
    pub fn display(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One `(role, text)` entry in the history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    /// Convert into the LLM wire format.
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(&self.text),
            Role::Assistant => Message::assistant(&self.text),
        }
    }
}

/// Conversation history for a single session.
#[derive(Clone, Debug)]
pub struct ChatContext {
    user_id: String,
    username: String,
    turns: Vec<Turn>,
}

impl ChatContext {
    /// Create an empty context for a user.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            turns: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Append a turn, preserving insertion order.
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn {
            role,
            text: text.into(),
            at: Utc::now(),
        });
    }

    /// Read-only view of every turn so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `max_turns` turns, oldest first.
    pub fn recent(&self, max_turns: usize) -> &[Turn] {
        let len = self.turns.len();
        &self.turns[len.saturating_sub(max_turns)..]
    }

    /// Render the last `max_turns` turns as a `CHAT HISTORY:` block for
    /// inclusion in instructions. Empty when there is no history.
    pub fn history_text(&self, max_turns: usize) -> String {
        if self.turns.is_empty() || max_turns == 0 {
            return String::new();
        }

        let mut text = String::from("CHAT HISTORY:\n");
        for turn in self.recent(max_turns) {
            text.push_str(turn.role.display());
            text.push_str(": ");
            text.push_str(&turn.text);
            text.push('\n');
        }
        text
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
