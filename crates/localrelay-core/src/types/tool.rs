//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Tool call requested by the model
///
/// `arguments` is the raw JSON payload exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Raw JSON argument payload
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw payload into tool arguments
    pub fn parsed_arguments(&self) -> ToolArguments {
        ToolArguments::parse(&self.arguments)
    }
}

/// Parsed tool arguments
///
/// Parsing is permissive: an empty or malformed payload yields an empty
/// argument object, and a missing field reads as an empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Parse a raw JSON payload
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(values)) => Self { values },
            _ => Self::default(),
        }
    }

    /// Get an argument by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get an argument as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get an argument as text, empty when absent
    ///
    /// Non-string values are rendered as JSON text.
    pub fn text_or_empty(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Whether no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Tool result fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// The result content
    pub content: String,
}

impl ToolResult {
    /// Create a tool result
    pub fn new(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
        }
    }
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    Auto,
    /// Don't use tools
    None,
    /// Force tool use
    Required,
}

impl Default for ToolChoice {
    fn default() -> Self {
        ToolChoice::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_creation() {
        let tool = Tool::new("SetActiveModel", "Sets the active model")
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "modelAlias": { "type": "string" }
                },
                "required": ["modelAlias"]
            }));

        assert_eq!(tool.name, "SetActiveModel");
        assert!(tool.input_schema.is_some());
    }

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall::new("call_123", "LoadModel", r#"{"modelAlias": "phi-4-mini"}"#);
        let args = call.parsed_arguments();

        assert_eq!(args.get_str("modelAlias"), Some("phi-4-mini"));
        assert_eq!(args.get_str("nonexistent"), None);
    }

    #[test]
    fn test_missing_field_reads_as_empty() {
        let args = ToolArguments::parse("{}");
        assert_eq!(args.text_or_empty("modelAlias"), "");
    }

    #[test]
    fn test_malformed_payload_is_empty() {
        assert!(ToolArguments::parse("").is_empty());
        assert!(ToolArguments::parse("not json").is_empty());
        assert!(ToolArguments::parse("[1, 2]").is_empty());
    }

    #[test]
    fn test_non_string_argument_rendered() {
        let args = ToolArguments::parse(r#"{"modelAlias": 42}"#);
        assert_eq!(args.text_or_empty("modelAlias"), "42");
    }
}
