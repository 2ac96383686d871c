use std::fmt;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Turn {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Local::now(),
        }
    }
}

/// Append-only transcript of a session. Index 0 is always the system turn.
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new(system_instruction: &str) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_instruction)],
        }
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.append(Turn::new(Role::User, message));
    }

    pub fn add_assistant_message(&mut self, message: &str) {
        self.append(Turn::new(Role::Assistant, message));
    }

    /// Further system turns are not accepted; the persona is fixed at creation.
    pub fn append(&mut self, turn: Turn) {
        if turn.role == Role::System {
            tracing::warn!("Ignoring attempt to append a second system turn");
            return;
        }
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn system_instruction(&self) -> &str {
        &self.turns[0].content
    }

    /// User and assistant turns, in the order they were added.
    pub fn dialogue(&self) -> &[Turn] {
        &self.turns[1..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }
}
