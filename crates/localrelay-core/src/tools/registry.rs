//! Tool registry for managing LLM tool calling
//!
//! The ToolRegistry is the central component for:
//! - Holding the tool handlers registered at startup
//! - Enabling and disabling tools from configuration
//! - Converting tools to the schema set advertised to the model
//! - Executing tool calls and returning results

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::logging::Logger;
use crate::types::{Tool, ToolArguments, ToolCall, ToolResult};

/// Errors raised by the registry itself
///
/// Handler failures never show up here; handlers report them in their text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No enabled tool with this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

pub type ToolRegistryResult<T> = Result<T, ToolError>;

/// Executable behaviour behind a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool and describe the outcome as text
    async fn call(&self, args: &ToolArguments) -> String;
}

/// Information about a tool with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for tool parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// Whether this tool is enabled
    pub enabled: bool,
    /// Source of this tool (e.g., "system", "models")
    pub source: String,
}

impl ToolInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            enabled: true,
            source: source.into(),
        }
    }

    /// Set the argument schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

impl From<&ToolInfo> for Tool {
    fn from(info: &ToolInfo) -> Self {
        Tool {
            name: info.name.clone(),
            description: info.description.clone(),
            input_schema: info.input_schema.clone(),
        }
    }
}

struct RegisteredTool {
    info: ToolInfo,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry for managing available tools
///
/// Registration order is the order tools are advertised in.
pub struct ToolRegistry {
    tools: RwLock<Vec<RegisteredTool>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty tool registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register(&self, info: ToolInfo, handler: Arc<dyn ToolHandler>) {
        let mut tools = self.tools.write();
        match tools.iter_mut().find(|t| t.info.name == info.name) {
            Some(existing) => {
                self.logger
                    .warn(&format!("[ToolRegistry] Replacing tool: {}", info.name));
                *existing = RegisteredTool { info, handler };
            }
            None => tools.push(RegisteredTool { info, handler }),
        }
    }

    /// Get tools for sending to LLM (enabled only)
    pub fn get_llm_tools(&self) -> Vec<Tool> {
        self.tools
            .read()
            .iter()
            .filter(|t| t.info.enabled)
            .map(|t| Tool::from(&t.info))
            .collect()
    }

    /// Enable or disable a tool
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) {
        let mut tools = self.tools.write();
        if let Some(tool) = tools.iter_mut().find(|t| t.info.name == name) {
            tool.info.enabled = enabled;
        }
    }

    /// Handler for an enabled tool
    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools
            .read()
            .iter()
            .find(|t| t.info.name == name && t.info.enabled)
            .map(|t| Arc::clone(&t.handler))
    }

    /// Execute a tool call from an LLM response
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolRegistryResult<ToolResult> {
        let handler = self
            .handler(&tool_call.name)
            .ok_or_else(|| ToolError::UnknownTool(tool_call.name.clone()))?;

        self.logger.info(&format!(
            "[ToolRegistry] Calling tool: {} ({})",
            tool_call.name, tool_call.id
        ));

        let args = tool_call.parsed_arguments();
        let content = handler.call(&args).await;

        self.logger.debug(&format!(
            "[ToolRegistry] {} returned {} bytes",
            tool_call.name,
            content.len()
        ));

        Ok(ToolResult::new(tool_call.id.clone(), content))
    }

    /// Get count of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Get count of enabled tools
    pub fn enabled_tool_count(&self) -> usize {
        self.tools.read().iter().filter(|t| t.info.enabled).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    struct Fixed(&'static str);

    #[async_trait]
    impl ToolHandler for Fixed {
        async fn call(&self, _args: &ToolArguments) -> String {
            self.0.to_string()
        }
    }

    struct EchoAlias;

    #[async_trait]
    impl ToolHandler for EchoAlias {
        async fn call(&self, args: &ToolArguments) -> String {
            format!("alias={}", args.text_or_empty("modelAlias"))
        }
    }

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        registry.register(
            ToolInfo::new("OpenTaskManager", "Open the Windows Task Manager", "system"),
            Arc::new(Fixed("opened")),
        );
        registry.register(
            ToolInfo::new("LoadModel", "Loads a model", "models").with_schema(serde_json::json!({
                "type": "object",
                "properties": {"modelAlias": {"type": "string"}},
                "required": ["modelAlias"]
            })),
            Arc::new(EchoAlias),
        );
        registry
    }

    #[test]
    fn test_disabled_tools_are_not_advertised() {
        let registry = registry();
        registry.set_tool_enabled("OpenTaskManager", false);

        let names: Vec<String> = registry.get_llm_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["LoadModel"]);
        assert_eq!(registry.tool_count(), 2);
    }

    #[test]
    fn test_llm_tools_keep_registration_order() {
        let names: Vec<String> = registry().get_llm_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["OpenTaskManager", "LoadModel"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = registry();
        registry.register(
            ToolInfo::new("OpenTaskManager", "Replacement", "system"),
            Arc::new(Fixed("again")),
        );
        assert_eq!(registry.tool_count(), 2);
        assert_eq!(registry.get_llm_tools()[0].description, "Replacement");
    }

    #[tokio::test]
    async fn test_execute_passes_parsed_arguments() {
        let call = ToolCall::new("call_1", "LoadModel", r#"{"modelAlias":"phi-4-mini"}"#);
        let result = registry().execute_tool_call(&call).await.unwrap();
        assert_eq!(result.call_id, "call_1");
        assert_eq!(result.content, "alias=phi-4-mini");
    }

    #[tokio::test]
    async fn test_malformed_arguments_read_as_empty() {
        let call = ToolCall::new("call_1", "LoadModel", "{not json");
        let result = registry().execute_tool_call(&call).await.unwrap();
        assert_eq!(result.content, "alias=");
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_tools_are_errors() {
        let registry = registry();
        let unknown = ToolCall::new("c", "FormatDisk", "{}");
        assert_eq!(
            registry.execute_tool_call(&unknown).await.unwrap_err(),
            ToolError::UnknownTool("FormatDisk".to_string())
        );

        registry.set_tool_enabled("OpenTaskManager", false);
        assert_eq!(registry.enabled_tool_count(), 1);
        let disabled = ToolCall::new("c", "OpenTaskManager", "{}");
        assert!(registry.execute_tool_call(&disabled).await.is_err());
    }
}
