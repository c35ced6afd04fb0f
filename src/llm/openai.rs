//! OpenAI-compatible chat completions provider.
//!
//! Reference [`LlmProvider`] implementation over the `/v1/chat/completions`
//! wire format. Works against any OpenAI-compatible endpoint via
//! [`OpenAiProvider::with_base_url`].

use crate::error::{Error, Result};
use crate::llm::{AssistantReply, CompletionRequest, LlmProvider, ToolDefinition};
use crate::message::{Message, ToolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Default OpenAI API base URL.
const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI-compatible LLM provider.
pub struct OpenAiProvider {
    /// HTTP client for API requests.
    client: Client,
    /// API key sent as a bearer token.
    api_key: String,
    /// Base URL for the API (overridable for compatible endpoints).
    api_base: String,
}

// -- Chat completions wire types --

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call in the wire format: the function arguments arrive as a
/// JSON-encoded string, not a structured value.
#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ApiFunctionDef,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDef {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a provider against a custom base URL.
    pub fn with_base_url(api_key: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base,
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System { content } => ApiMessage {
                    role: "system".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::User { content } => ApiMessage {
                    role: "user".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::Assistant {
                    content,
                    tool_calls,
                } => ApiMessage {
                    role: "assistant".to_string(),
                    content: content.clone(),
                    tool_calls: if tool_calls.is_empty() {
                        None
                    } else {
                        Some(tool_calls.iter().map(convert_tool_call).collect())
                    },
                    tool_call_id: None,
                },
                Message::Tool {
                    tool_call_id,
                    content,
                } => ApiMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_call_id.clone()),
                },
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Option<Vec<ApiTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|t| ApiTool {
                    tool_type: "function".to_string(),
                    function: ApiFunctionDef {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
        )
    }
}

fn convert_tool_call(call: &ToolCall) -> ApiToolCall {
    ApiToolCall {
        id: call.id.clone(),
        call_type: "function".to_string(),
        function: ApiFunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

fn parse_tool_call(call: ApiToolCall) -> ToolCall {
    let arguments = serde_json::from_str(&call.function.arguments)
        .unwrap_or(serde_json::Value::String(call.function.arguments));
    ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantReply> {
        let body = ApiRequest {
            model: request.model,
            messages: Self::convert_messages(&request.messages),
            tools: Self::convert_tools(&request.tools),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::Provider(format!("{}: {}", status, message)));
        }

        let parsed: ApiResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("response contained no choices".to_string()))?;

        Ok(AssistantReply {
            content: choice.message.content,
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(parse_tool_call)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_messages_roles() {
        let messages = vec![
            Message::System {
                content: "be safe".to_string(),
            },
            Message::user("hello"),
            Message::assistant("hi"),
            Message::tool_result("call_1", "data"),
        ];
        let converted = OpenAiProvider::convert_messages(&messages);
        let roles: Vec<&str> = converted.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);
        assert_eq!(converted[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_tool_call_arguments_encoded_as_string() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "email-lookup".to_string(),
            arguments: serde_json::json!({"email": "x@example.com"}),
        };
        let api_call = convert_tool_call(&call);
        assert_eq!(api_call.function.arguments, r#"{"email":"x@example.com"}"#);

        let roundtrip = parse_tool_call(api_call);
        assert_eq!(roundtrip.arguments, call.arguments);
    }

    #[test]
    fn test_parse_tool_call_with_invalid_json_arguments() {
        let api_call = ApiToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: ApiFunctionCall {
                name: "fetch".to_string(),
                arguments: "not json".to_string(),
            },
        };
        let call = parse_tool_call(api_call);
        assert_eq!(call.arguments, serde_json::Value::String("not json".to_string()));
    }

    #[test]
    fn test_convert_tools_empty_is_none() {
        assert!(OpenAiProvider::convert_tools(&[]).is_none());
    }
}
