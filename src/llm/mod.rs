//! LLM integration for structured deal selection.
//!
//! Defines the `StructuredChat` trait the scanner depends on and provides
//! a chat-completions implementation for Azure OpenAI and OpenAI.

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::ScanError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A chat request whose reply must conform to a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub messages: Vec<ChatMessage>,
    pub schema_name: String,
    pub schema: serde_json::Value,
}

/// Abstraction over chat models that support structured output.
///
/// Implementors send the ordered messages and return the raw JSON text of
/// the first choice. Provider failures map to `ScanError::ExternalService`;
/// refusals and truncated output map to `ScanError::SchemaValidation`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StructuredChat: Send + Sync {
    async fn complete(&self, request: &StructuredRequest) -> Result<String, ScanError>;
}
