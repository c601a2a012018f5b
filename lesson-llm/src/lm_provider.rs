//! Language-model interface shared by real clients and the mock
//!
//! Lesson code depends on [`LanguageModel`] only. Whether a call reaches a
//! network provider or the offline [`MockLm`](crate::MockLm) is decided by
//! whoever constructs the model, never by the call site.

use crate::error::{LlmError, LlmResult};
use crate::response::LmResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to a generation call: a single prompt or a list of messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
}

impl LmRequest {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            messages: None,
        }
    }

    pub fn messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            prompt: None,
            messages: Some(messages),
        }
    }

    /// Flatten the request into one prompt string.
    ///
    /// Message contents are joined with newlines regardless of role, so a
    /// conversation is treated as one block of text. Exactly one of `prompt`
    /// and `messages` must carry non-blank text.
    pub fn effective_prompt(&self) -> LlmResult<String> {
        let prompt = self.prompt.as_deref().filter(|p| !p.trim().is_empty());
        let messages = self
            .messages
            .as_deref()
            .filter(|m| m.iter().any(|msg| !msg.content.trim().is_empty()));

        match (prompt, messages) {
            (Some(prompt), None) => Ok(prompt.to_string()),
            (None, Some(messages)) => Ok(messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            (None, None) => Err(LlmError::InvalidInput(
                "either prompt or messages is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(LlmError::InvalidInput(
                "prompt and messages are mutually exclusive".to_string(),
            )),
        }
    }
}

/// A text-generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: LmRequest) -> LlmResult<LmResponse>;

    /// Model identifier reported in responses
    fn name(&self) -> &str;
}
