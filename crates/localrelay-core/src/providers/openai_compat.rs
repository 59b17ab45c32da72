//! OpenAI-compatible chat completion client
//!
//! Talks to any server exposing `POST {api_base}/chat/completions`: LM Studio,
//! the Foundry Local service, Ollama's OpenAI surface, and so on. Requests are
//! non-streaming because the orchestrator needs the finish reason and the
//! complete tool call list of each turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::Logger;
use crate::types::{
    ChatCompletion, ChatMessage, FinishReason, MessageRole, Tool, ToolCall, ToolChoice,
};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, CompletionOptions};

/// Default LM Studio endpoint
pub const LM_STUDIO_API_BASE: &str = "http://127.0.0.1:1234/v1";

/// Placeholder key for local servers that ignore authentication
pub const NO_KEY_REQUIRED: &str = "no-key-required";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: MessageRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<FinishReason>,
}

fn function_type() -> String {
    "function".to_string()
}

// ============================================================================
// Conversion
// ============================================================================

fn to_wire_message(msg: &ChatMessage) -> WireMessage {
    let tool_calls = if msg.tool_calls.is_empty() {
        None
    } else {
        Some(
            msg.tool_calls
                .iter()
                .map(|tc| WireToolCall {
                    id: tc.id.clone(),
                    call_type: function_type(),
                    function: WireFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect(),
        )
    };

    // Assistant turns that only carry tool calls are sent with null content
    let content = if msg.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(msg.content.clone())
    };

    WireMessage {
        role: msg.role,
        content,
        tool_calls,
        tool_call_id: msg.tool_call_id.clone(),
    }
}

fn to_wire_tool(tool: &Tool) -> WireTool {
    WireTool {
        tool_type: "function",
        function: WireFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

fn from_wire_message(msg: WireMessage) -> ChatMessage {
    let tool_calls = msg
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
        .collect();

    ChatMessage::assistant_with_tool_calls(msg.content.unwrap_or_default(), tool_calls)
}

// ============================================================================
// Provider
// ============================================================================

/// Chat provider for OpenAI-compatible HTTP servers
pub struct OpenAiCompatProvider {
    provider_id: String,
    api_base: String,
    api_key: String,
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiCompatProvider {
    /// Create a provider for an endpoint
    pub fn new(
        provider_id: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            logger,
        }
    }

    /// Provider pointed at a local LM Studio server
    pub fn lm_studio(logger: Arc<dyn Logger>) -> Self {
        Self::new("openai", LM_STUDIO_API_BASE, NO_KEY_REQUIRED, logger)
    }

    /// The API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &CompletionOptions,
    ) -> ProviderResult<ChatCompletion> {
        let tools: Vec<WireTool> = options
            .tools
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(to_wire_tool)
            .collect();
        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some(options.tool_choice.unwrap_or_default())
        };

        let request = WireRequest {
            model,
            messages: messages.iter().map(to_wire_message).collect(),
            tools,
            tool_choice,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        self.logger.debug(&format!(
            "[OpenAiCompat] POST {} model={} messages={} tools={}",
            self.completions_url(),
            model,
            request.messages.len(),
            request.tools.len()
        ));

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logger.error(&format!(
                "[OpenAiCompat] {} returned {}: {}",
                self.provider_id, status, body
            ));
            return Err(ProviderError::api_error(&self.provider_id, status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: WireResponse = serde_json::from_str(&body)?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            ProviderError::invalid_response(&self.provider_id, "response contained no choices")
        })?;

        let finish_reason = choice
            .finish_reason
            .unwrap_or_else(|| FinishReason::Other("missing".to_string()));

        self.logger.debug(&format!(
            "[OpenAiCompat] finish_reason={} tool_calls={}",
            finish_reason,
            choice.message.tool_calls.as_ref().map_or(0, |c| c.len())
        ));

        Ok(ChatCompletion::new(finish_reason, from_wire_message(choice.message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "openai",
            format!("{}/v1", server.uri()),
            "test-key",
            Arc::new(NoOpLogger),
        )
    }

    #[test]
    fn test_wire_message_for_tool_result() {
        let wire = to_wire_message(&ChatMessage::tool("call_1", "ok"));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            json,
            json!({"role": "tool", "content": "ok", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn test_wire_message_for_tool_request_has_null_content() {
        let msg = ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("call_1", "OpenTaskManager", "{}")],
        );
        let json = serde_json::to_value(to_wire_message(&msg)).unwrap();
        assert_eq!(json["content"], Value::Null);
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "OpenTaskManager");
    }

    #[test]
    fn test_wire_tool_without_schema_omits_parameters() {
        let json = serde_json::to_value(to_wire_tool(&Tool::new("ListLoadedModels", "List"))).unwrap();
        assert_eq!(json["type"], "function");
        assert!(json["function"].get("parameters").is_none());
    }

    #[tokio::test]
    async fn test_stop_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": "qwen3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Paris"},
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let completion = provider(&server)
            .complete(&[ChatMessage::user("Capital of France?")], "qwen3", &CompletionOptions::new())
            .await
            .expect("completion should succeed");

        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.text(), "Paris");
    }

    #[tokio::test]
    async fn test_tool_call_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"tool_choice": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": {"name": "LoadModel", "arguments": "{\"modelAlias\":\"phi-4-mini\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            })))
            .mount(&server)
            .await;

        let options = CompletionOptions::new().with_tools(vec![Tool::new("LoadModel", "Load")]);
        let completion = provider(&server)
            .complete(&[ChatMessage::user("load phi")], "qwen3", &options)
            .await
            .expect("completion should succeed");

        assert_eq!(completion.finish_reason, FinishReason::ToolCalls);
        let call = &completion.message.tool_calls[0];
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.parsed_arguments().get_str("modelAlias"), Some("phi-4-mini"));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[ChatMessage::user("hi")], "missing", &CompletionOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ApiError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[ChatMessage::user("hi")], "m", &CompletionOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }
}
