//! Mock provider and model manager for testing
//!
//! Deterministic, scriptable stand-ins for the network clients. Every request
//! the mock provider receives is recorded so tests can assert on the exact
//! history and tool set the orchestrator sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatProvider, CompletionOptions, ModelManager};
use crate::logging::Logger;
use crate::types::{ChatCompletion, ChatMessage, MessageRole, ModelInfo};

/// What the mock provider answers once its script runs dry
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Echo back the last user message
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Fail every call
    Error(String),
}

impl Default for MockMode {
    fn default() -> Self {
        MockMode::Echo
    }
}

/// A request captured by the mock provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub options: CompletionOptions,
}

impl RecordedRequest {
    /// Names of the tools advertised with this request
    pub fn tool_names(&self) -> Vec<String> {
        self.options
            .tools
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Mock chat provider
///
/// Scripted completions are returned in order; after that the fallback
/// `MockMode` decides the answer.
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<ChatCompletion>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider in echo mode
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: MockMode::default(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back the last user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: MockMode::Fixed(response.into()),
            ..Self::new(logger)
        }
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: MockMode::Error(message.into()),
            ..Self::new(logger)
        }
    }

    /// Create a provider that plays back completions in order
    pub fn scripted(completions: Vec<ChatCompletion>, logger: Arc<dyn Logger>) -> Self {
        let provider = Self::new(logger);
        provider.script.lock().extend(completions);
        provider
    }

    /// Queue another completion
    pub fn push(&self, completion: ChatCompletion) {
        self.script.lock().push_back(completion);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of completion calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &CompletionOptions,
    ) -> ProviderResult<ChatCompletion> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            model: model.to_string(),
            options: options.clone(),
        });

        let scripted = self.script.lock().pop_front();
        if let Some(completion) = scripted {
            self.logger.debug(&format!(
                "MockProvider: scripted completion, finish_reason={}",
                completion.finish_reason
            ));
            return Ok(completion);
        }

        match &self.mode {
            MockMode::Echo => {
                let user_msg = Self::last_user_message(messages);
                self.logger
                    .debug(&format!("MockProvider: Echo mode, echoing: {}", user_msg));
                Ok(ChatCompletion::stop(format!("Echo: {}", user_msg)))
            }
            MockMode::Fixed(response) => Ok(ChatCompletion::stop(response.clone())),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        }
    }
}

/// In-memory model manager
#[derive(Default)]
pub struct MockModelManager {
    catalog: Vec<ModelInfo>,
    loaded: Mutex<Vec<ModelInfo>>,
    failure: Option<String>,
}

impl MockModelManager {
    /// Create a manager with a catalog and nothing loaded
    pub fn new(catalog: Vec<ModelInfo>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Mark models as already loaded
    pub fn with_loaded(self, loaded: Vec<ModelInfo>) -> Self {
        *self.loaded.lock() = loaded;
        self
    }

    /// Make every call fail with a message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn check(&self) -> ProviderResult<()> {
        match &self.failure {
            Some(message) => Err(ProviderError::Other(message.clone())),
            None => Ok(()),
        }
    }

    fn resolve(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        self.catalog
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(alias_or_id))
            .or_else(|| self.catalog.iter().find(|m| m.matches(alias_or_id)))
            .cloned()
            .ok_or_else(|| ProviderError::ModelNotFound(alias_or_id.to_string()))
    }
}

#[async_trait]
impl ModelManager for MockModelManager {
    async fn list_catalog_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.check()?;
        Ok(self.catalog.clone())
    }

    async fn list_loaded_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.check()?;
        Ok(self.loaded.lock().clone())
    }

    async fn get_model_info(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        self.check()?;
        self.resolve(alias_or_id)
    }

    async fn load_model(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        self.check()?;
        let info = self.resolve(alias_or_id)?;
        let mut loaded = self.loaded.lock();
        if !loaded.iter().any(|m| m.id == info.id) {
            loaded.push(info.clone());
        }
        Ok(info)
    }

    fn endpoint(&self) -> String {
        "http://localhost:0/mock/v1".to_string()
    }

    fn api_key(&self) -> String {
        "mock-key".to_string()
    }
}
