use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ChatMessage, LlmClient, LlmError, LlmResponse};
use crate::protocol::TokenUsage;

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Text(String),
    /// Fail the call with [`LlmError::Other`]
    Fail(String),
}

impl From<&str> for ScriptedReply {
    fn from(text: &str) -> Self {
        ScriptedReply::Text(text.to_string())
    }
}

impl From<String> for ScriptedReply {
    fn from(text: String) -> Self {
        ScriptedReply::Text(text)
    }
}

type Responder = dyn Fn(&[ChatMessage]) -> ScriptedReply + Send + Sync;

enum Script {
    Queue(Mutex<VecDeque<ScriptedReply>>),
    Responder(Box<Responder>),
}

/// In-process LLM that answers from a script and records every conversation
///
/// Token usage is approximated by whitespace-separated word counts.
pub struct ScriptedLlm {
    model: String,
    script: Script,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedLlm {
    /// Answer each call with the next reply in order
    pub fn from_replies<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ScriptedReply>,
    {
        Self {
            model: "scripted".into(),
            script: Script::Queue(Mutex::new(replies.into_iter().map(Into::into).collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Compute each answer from the conversation
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> ScriptedReply + Send + Sync + 'static,
    {
        Self {
            model: "scripted".into(),
            script: Script::Responder(Box::new(responder)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Every conversation received so far
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        self.calls.lock().push(messages.to_vec());

        let reply = match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .pop_front()
                .ok_or_else(|| LlmError::Other("scripted replies exhausted".into()))?,
            Script::Responder(responder) => responder(messages),
        };

        match reply {
            ScriptedReply::Text(content) => {
                let prompt_tokens = messages.iter().map(|m| word_count(&m.content)).sum();
                let completion_tokens = word_count(&content);
                Ok(LlmResponse {
                    content,
                    usage: TokenUsage {
                        prompt_tokens,
                        completion_tokens,
                        total_tokens: prompt_tokens + completion_tokens,
                        successful_requests: 1,
                    },
                })
            }
            ScriptedReply::Fail(message) => Err(LlmError::Other(message)),
        }
    }
}
