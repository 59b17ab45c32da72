//! Backend that lets the model call local tools

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::conversation::ConversationState;
use crate::logging::Logger;
use crate::orchestrator::Orchestrator;
use crate::providers::ChatProvider;
use crate::tools::ToolRegistry;
use crate::types::{BackendKind, ChatMessage, HistoryRetention};
use super::{BackendResult, ModelBackend};

/// Runs the tool-calling loop against a fixed model
pub struct ToolCallingBackend {
    name: String,
    model: String,
    orchestrator: Orchestrator,
    conversation: Mutex<ConversationState>,
    logger: Arc<dyn Logger>,
}

impl ToolCallingBackend {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        provider: Arc<dyn ChatProvider>,
        registry: Arc<ToolRegistry>,
        retention: HistoryRetention,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            orchestrator: Orchestrator::new(provider, registry, Arc::clone(&logger)),
            conversation: Mutex::new(ConversationState::new(retention)),
            logger,
        }
    }

    /// The model id sent with every completion
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelBackend for ToolCallingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::ToolCalling
    }

    async fn respond(&self, text: &str) -> BackendResult<String> {
        let mut conversation = self.conversation.lock().await;
        conversation.begin_request();
        let mark = conversation.len();

        self.logger
            .debug(&format!("[{}] Request with model {}", self.name, self.model));

        let result = self
            .orchestrator
            .run(&mut conversation, &self.model, text)
            .await;
        if result.is_err() {
            conversation.truncate(mark);
        }
        result
    }

    async fn history(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.messages().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendError;
    use crate::logging::NoOpLogger;
    use crate::providers::MockProvider;
    use crate::types::{ChatCompletion, MessageRole, ToolCall};

    fn backend(provider: Arc<MockProvider>, retention: HistoryRetention) -> ToolCallingBackend {
        ToolCallingBackend::new(
            "lmstudio",
            "qwen3",
            provider,
            Arc::new(ToolRegistry::new(Arc::new(NoOpLogger))),
            retention,
            Arc::new(NoOpLogger),
        )
    }

    #[tokio::test]
    async fn test_per_request_history_is_cleared() {
        let provider = Arc::new(MockProvider::scripted(
            vec![ChatCompletion::stop("one"), ChatCompletion::stop("two")],
            Arc::new(NoOpLogger),
        ));
        let backend = backend(provider.clone(), HistoryRetention::PerRequest);

        assert_eq!(backend.respond("first").await.unwrap(), "one");
        assert_eq!(backend.respond("second").await.unwrap(), "two");

        let second = &provider.requests()[1];
        assert_eq!(second.messages.len(), 1);
        assert_eq!(second.messages[0].content, "second");
        assert_eq!(second.model, "qwen3");
    }

    #[tokio::test]
    async fn test_accumulate_keeps_history() {
        let provider = Arc::new(MockProvider::scripted(
            vec![ChatCompletion::stop("one"), ChatCompletion::stop("two")],
            Arc::new(NoOpLogger),
        ));
        let backend = backend(provider.clone(), HistoryRetention::Accumulate);

        backend.respond("first").await.unwrap();
        backend.respond("second").await.unwrap();

        let roles: Vec<MessageRole> = backend.history().await.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User, MessageRole::Assistant]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_with_empty_registry() {
        let provider = Arc::new(MockProvider::scripted(
            vec![ChatCompletion::tool_calls(vec![ToolCall::new("c", "OpenTaskManager", "{}")])],
            Arc::new(NoOpLogger),
        ));
        let backend = backend(provider.clone(), HistoryRetention::PerRequest);

        let err = backend.respond("open it").await.unwrap_err();
        assert!(matches!(err, BackendError::UnknownTool(_)));
        // No tools registered, so none advertised
        assert!(provider.requests()[0].options.tools.is_none());
    }

    #[tokio::test]
    async fn test_failed_request_is_rolled_back() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                ChatCompletion::stop("hello"),
                ChatCompletion::tool_calls(vec![ToolCall::new("x", "FormatDisk", "{}")]),
                ChatCompletion::stop("ok"),
            ],
            Arc::new(NoOpLogger),
        ));
        let backend = backend(provider.clone(), HistoryRetention::Accumulate);

        backend.respond("hi").await.unwrap();
        assert!(backend.respond("format it").await.is_err());
        assert_eq!(backend.history().await.len(), 2);

        assert_eq!(backend.respond("try again").await.unwrap(), "ok");

        let third = &provider.requests()[2];
        let roles: Vec<MessageRole> = third.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]);
        assert!(third.messages.iter().all(|m| m.tool_calls.is_empty()));
        assert_eq!(third.messages[2].content, "try again");
    }
}
