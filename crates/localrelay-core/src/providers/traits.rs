//! Capability traits consumed by backends and tools

use async_trait::async_trait;

use crate::types::{ChatCompletion, ChatMessage, ModelInfo, Tool, ToolChoice};
use super::error::ProviderResult;

/// Options for chat completion requests
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use
    pub tools: Option<Vec<Tool>>,
    /// Tool choice behavior
    pub tool_choice: Option<ToolChoice>,
}

impl CompletionOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Whether any tools are attached
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Chat-completion capability
///
/// One call returns one completed turn with its finish reason. Calls are
/// attempted once; retries are the caller's business (and nobody retries).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g. "openai", "foundry", "mock")
    fn name(&self) -> &str;

    /// Run one chat completion over the full message history
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &CompletionOptions,
    ) -> ProviderResult<ChatCompletion>;
}

/// Model-manager capability (Foundry Local and friends)
#[async_trait]
pub trait ModelManager: Send + Sync {
    /// Models available for download/loading
    async fn list_catalog_models(&self) -> ProviderResult<Vec<ModelInfo>>;

    /// Models currently loaded by the service
    async fn list_loaded_models(&self) -> ProviderResult<Vec<ModelInfo>>;

    /// Resolve an alias or full id to model info
    async fn get_model_info(&self, alias_or_id: &str) -> ProviderResult<ModelInfo>;

    /// Load a model and return its info
    async fn load_model(&self, alias_or_id: &str) -> ProviderResult<ModelInfo>;

    /// OpenAI-compatible base URL served by the manager
    fn endpoint(&self) -> String;

    /// API key for the OpenAI-compatible endpoint
    fn api_key(&self) -> String;

    /// Resolve and load a model, ready for chat completions
    async fn start_model(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        let info = self.get_model_info(alias_or_id).await?;
        self.load_model(&info.id).await
    }
}
