//! Prompt types submitted by callers.
//!
//! A prompt is backend-neutral; each backend adapter translates it into its
//! own payload when the envelope is built.

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// Prompt for a single generation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Conversation messages, oldest first
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Prompt {
    /// Create an empty prompt
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a prompt holding a single user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new().message(ChatMessage::user(content))
    }

    /// Append a message
    #[must_use]
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Append a system message
    #[must_use]
    pub fn system_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::system(content))
    }

    /// Append a user message
    #[must_use]
    pub fn user_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::user(content))
    }

    /// Append an assistant message
    #[must_use]
    pub fn assistant_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::assistant(content))
    }

    /// Set max tokens
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Concatenated system messages, if any
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Check the prompt can be sent to a backend
    ///
    /// # Errors
    /// Returns a configuration error if the prompt has no user or assistant
    /// message, or if the temperature is out of range
    pub fn validate(&self) -> GatewayResult<()> {
        if !self.messages.iter().any(|m| m.role != MessageRole::System) {
            return Err(GatewayError::configuration(
                "prompt must contain at least one user or assistant message",
            ));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(GatewayError::configuration(format!(
                    "temperature {temperature} is outside 0.0..=2.0"
                )));
            }
        }
        Ok(())
    }
}

/// Chat message in a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}
