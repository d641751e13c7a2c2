//! Role-tagged message list shown to the user.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GREETING: &str =
    "Hello! I'm your personal AI assistant. How can I help you today?";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Ai,
}

/// One entry in the conversation.
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

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

/// Ordered messages; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a single AI greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![Message::ai(greeting)],
        }
    }

    pub fn messages(&self) -> &[Message] {
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

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append the empty AI message that streamed text will extend.
    pub fn push_placeholder(&mut self) {
        self.messages.push(Message::ai(String::new()));
    }

    /// Extend the trailing AI message. Returns false when the last message
    /// is not an AI message.
    pub fn append_to_placeholder(&mut self, text: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Ai => {
                last.content.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Overwrite the trailing AI message, discarding streamed text.
    pub fn replace_placeholder(&mut self, text: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Ai => {
                last.content = text.into();
                true
            }
            _ => false,
        }
    }
}
