//! Chat completion result types

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// Why the model stopped producing output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural end of the assistant turn
    Stop,
    /// The model wants tool calls resolved before it can continue
    ToolCalls,
    /// Token limit reached
    Length,
    /// Content omitted by a content filter
    ContentFilter,
    /// Legacy single function call, superseded by tool calls
    FunctionCall,
    /// Anything the server reported that we don't recognize
    Other(String),
}

impl FinishReason {
    /// Parse the wire value used by OpenAI-compatible servers
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "tool_calls" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "function_call" => FinishReason::FunctionCall,
            other => FinishReason::Other(other.to_string()),
        }
    }

    /// The wire value for this reason
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::FunctionCall => "function_call",
            FinishReason::Other(s) => s,
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(FinishReason::from_wire(&value))
    }
}

/// One completed chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Terminal status of the call
    #[serde(rename = "finishReason")]
    pub finish_reason: FinishReason,
    /// The assistant message produced (text and/or tool calls)
    pub message: ChatMessage,
}

impl ChatCompletion {
    /// Create a completion
    pub fn new(finish_reason: FinishReason, message: ChatMessage) -> Self {
        Self {
            finish_reason,
            message,
        }
    }

    /// A plain text completion that ends the turn
    pub fn stop(text: impl Into<String>) -> Self {
        Self::new(FinishReason::Stop, ChatMessage::assistant(text))
    }

    /// A completion requesting tool calls
    pub fn tool_calls(calls: Vec<super::tool::ToolCall>) -> Self {
        Self::new(
            FinishReason::ToolCalls,
            ChatMessage::assistant_with_tool_calls("", calls),
        )
    }

    /// Get the assistant text
    pub fn text(&self) -> &str {
        self.message.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    #[test]
    fn test_finish_reason_wire_values() {
        assert_eq!(FinishReason::from_wire("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(FinishReason::from_wire("length"), FinishReason::Length);
        assert_eq!(FinishReason::from_wire("content_filter"), FinishReason::ContentFilter);
        assert_eq!(FinishReason::from_wire("function_call"), FinishReason::FunctionCall);
        assert_eq!(
            FinishReason::from_wire("eos"),
            FinishReason::Other("eos".to_string())
        );
    }

    #[test]
    fn test_finish_reason_serde() {
        let reason: FinishReason = serde_json::from_str("\"tool_calls\"").unwrap();
        assert_eq!(reason, FinishReason::ToolCalls);
        assert_eq!(serde_json::to_string(&FinishReason::Other("x".into())).unwrap(), "\"x\"");
    }

    #[test]
    fn test_completion_helpers() {
        let done = ChatCompletion::stop("Paris");
        assert_eq!(done.text(), "Paris");
        assert_eq!(done.finish_reason, FinishReason::Stop);

        let calls = ChatCompletion::tool_calls(vec![ToolCall::new("c1", "ListLoadedModels", "{}")]);
        assert!(calls.message.has_tool_calls());
    }
}
