//! LLM client port
//!
//! Agents talk to language models only through [`LlmClient`]. The crate ships
//! an OpenAI-compatible HTTP client and a scripted client for tests.

mod openai;
mod scripted;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use scripted::{ScriptedLlm, ScriptedReply};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::TokenUsage;

/// Errors that can occur while calling an LLM
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key (expected in ${0})")]
    MissingApiKey(String),

    #[error("API key is empty")]
    EmptyApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Completion returned by an LLM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// Language model used by agents
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier, used for logging
    fn model(&self) -> &str;

    /// Complete a conversation
    async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError>;
}
