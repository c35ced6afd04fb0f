//! LLM provider seam
//!
//! The gate consumes model completion as an opaque capability: given
//! messages and tool definitions, produce an assistant reply. Providers
//! implement [`LlmProvider`]; the gate never depends on a concrete API.

pub mod openai;

use crate::error::Result;
use crate::message::{Message, ToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiProvider;

/// Tool definition advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the tool's parameters
    pub parameters: serde_json::Value,
}

/// A completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A plain text request with no tools.
    pub fn text(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The assistant reply produced by a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantReply {
    /// Text-only reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Convert into a conversation message.
    pub fn into_message(self) -> Message {
        Message::Assistant {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

/// Model completion capability
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Produce an assistant reply for the given request.
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantReply>;
}

/// A single streamed chunk, in the chat-completions chunk shape.
///
/// Used for refusal substitution: when a tool invocation is denied the
/// entire assistant message is replaced by one synthetic chunk, emitted
/// only after the policy pipeline for the turn has fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

/// One choice within a streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: AssistantReply,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl CompletionChunk {
    /// Build the single substituted chunk for a policy refusal.
    pub fn refusal(model: impl Into<String>, refusal_text: impl Into<String>) -> Self {
        Self {
            id: "chatcmpl-blocked".to_string(),
            object: "chat.completion.chunk".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: AssistantReply::text(refusal_text),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }
}
