//! Conversation message types
//!
//! Wire-compatible with the OpenAI chat completions message format: role
//! tag, text content, tool calls on assistant messages, and tool results
//! keyed by `tool_call_id`.

use serde::{Deserialize, Serialize};

/// A tool call requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id (e.g. `call_abc123`)
    pub id: String,
    /// Name of the tool being invoked
    pub name: String,
    /// Call arguments as structured JSON
    pub arguments: serde_json::Value,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    /// Plain user message
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Assistant message with text content and no tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Tool result message
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Role string as it appears on the wire
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }

    /// Tool call id, for tool result messages
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::Tool { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }
}

/// Parse a tool result payload for policy evaluation.
///
/// Tool results arrive as strings on the wire; structured payloads are
/// JSON-encoded. Non-JSON content is evaluated as a plain string value.
pub fn parse_tool_payload(content: &str) -> serde_json::Value {
    serde_json::from_str(content)
        .unwrap_or_else(|_| serde_json::Value::String(content.to_string()))
}
