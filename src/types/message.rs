//! Role-tagged chat messages sent to the completion provider.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text.into(),
        }
    }

    /// `[system?, user]`, skipping an absent or empty system prompt.
    pub fn prompt_pair(system_prompt: Option<&str>, user_prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt.filter(|s| !s.is_empty()) {
            messages.push(Message::system(sys));
        }
        messages.push(Message::user(user_prompt));
        messages
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}
