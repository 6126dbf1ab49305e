//! OpenAI-compatible chat completions.
//!
//! - [`ChatTransport`]: one request/response round trip
//! - [`HttpChatTransport`]: reqwest implementation against `{base_url}/chat/completions`
//! - [`OpenAiExecutor`]: [`AgentExecutor`](crate::collaborator::AgentExecutor)
//!   that drives a task through the chat endpoint

pub mod executor;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capability::Capability;
use crate::config::{LlmConfig, OPENAI_API_KEY_VAR};
use crate::error::CollaboratorError;

pub use executor::OpenAiExecutor;

/// A single chat message, including tool-call plumbing fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments object, as sent by the provider.
    #[serde(default)]
    pub arguments: String,
}

impl FunctionCall {
    /// Extract the `input` argument. Falls back to the raw argument string
    /// when it is not a JSON object with a string `input`.
    pub fn input(&self) -> String {
        serde_json::from_str::<Value>(&self.arguments)
            .ok()
            .and_then(|v| v.get("input").and_then(|i| i.as_str()).map(str::to_string))
            .unwrap_or_else(|| self.arguments.clone())
    }
}

/// Body of a `/chat/completions` request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Choice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn into_message(self) -> Result<ChatMessage, CollaboratorError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| CollaboratorError::MalformedResponse("no choices returned".to_string()))
    }
}

/// Function-tool definition for one capability. Every capability takes a
/// single string argument named `input`.
pub fn tool_definition(capability: &dyn Capability) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": capability.name(),
            "description": capability.description(),
            "parameters": {
                "type": "object",
                "properties": {
                    "input": { "type": "string", "description": "Input for the tool" }
                },
                "required": ["input"]
            }
        }
    })
}

/// One chat completion round trip.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CollaboratorError>;
}

/// [`ChatTransport`] over HTTPS with reqwest.
pub struct HttpChatTransport {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpChatTransport {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CollaboratorError> {
        let api_key =
            self.config
                .api_key
                .as_deref()
                .ok_or_else(|| CollaboratorError::MissingCredential {
                    variable: OPENAI_API_KEY_VAR.to_string(),
                })?;

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => response
                .json::<ChatResponse>()
                .await
                .map_err(|e| CollaboratorError::MalformedResponse(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(CollaboratorError::Api {
                status: 401,
                message: "authentication failed, check your API key".to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(CollaboratorError::Api {
                status: 429,
                message: "rate limit exceeded".to_string(),
            }),
            status => {
                let body: Option<Value> = response.json().await.ok();
                let message = body
                    .as_ref()
                    .and_then(|v| v.get("error").and_then(|e| e.get("message")))
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown error")
                    .to_string();
                Err(CollaboratorError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::EchoCapability;

    #[test]
    fn test_tool_definition_shape() {
        let def = tool_definition(&EchoCapability::new("echo"));
        assert_eq!(def["type"], "function");
        assert_eq!(def["function"]["name"], "echo");
        assert_eq!(def["function"]["parameters"]["required"][0], "input");
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.5,
            tools: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json["messages"][0].get("tool_calls").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "web_search", "arguments": "{\"input\":\"rust\"}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        let message = response.into_message().unwrap();
        let calls = message.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "web_search");
        assert_eq!(calls[0].function.input(), "rust");
    }

    #[test]
    fn test_function_input_falls_back_to_raw_arguments() {
        let call = FunctionCall {
            name: "scrape_website".to_string(),
            arguments: "https://example.com".to_string(),
        };
        assert_eq!(call.input(), "https://example.com");
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let response = ChatResponse { choices: vec![] };
        assert!(matches!(
            response.into_message(),
            Err(CollaboratorError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let transport = HttpChatTransport::new(LlmConfig::default());
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.0,
            tools: vec![],
        };
        let err = transport.complete(&request).await.unwrap_err();
        match err {
            CollaboratorError::MissingCredential { variable } => {
                assert_eq!(variable, "OPENAI_API_KEY")
            }
            other => panic!("Expected MissingCredential, got {:?}", other),
        }
    }
}
