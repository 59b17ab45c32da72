//! Tool-calling conversation loop
//!
//! ```text
//!            user message
//!                 │
//!                 ▼
//!   ┌──────► AwaitingModel ──── stop ────► Completed(text)
//!   │             │
//!   │         tool_calls
//!   │             ▼
//!   └──── DispatchingTools(batch)
//! ```
//!
//! `length`, `content_filter`, `function_call` and unrecognised finish
//! reasons end the request with an error. There is no cap on rounds.

use std::sync::Arc;

use crate::backends::{BackendError, BackendResult};
use crate::conversation::ConversationState;
use crate::logging::Logger;
use crate::providers::{ChatProvider, CompletionOptions};
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, FinishReason, ToolCall, ToolChoice};
use crate::{debug_log, log_debug, log_info, log_warn};

/// Where the loop is
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorState {
    /// One completion call is due
    AwaitingModel,
    /// Tool calls to run in issuance order
    DispatchingTools(Vec<ToolCall>),
    /// Final assistant text
    Completed(String),
}

/// Drives one request through the tool-calling loop
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            registry,
            logger,
        }
    }

    /// Append the user text and loop until the model stops
    pub async fn run(
        &self,
        conversation: &mut ConversationState,
        model: &str,
        user_text: &str,
    ) -> BackendResult<String> {
        conversation.push(ChatMessage::user(user_text));

        let tools = self.registry.get_llm_tools();
        let mut options = CompletionOptions::new();
        if !tools.is_empty() {
            options = options.with_tools(tools).with_tool_choice(ToolChoice::Auto);
        }

        let mut state = OrchestratorState::AwaitingModel;
        let mut round = 0usize;
        loop {
            state = match state {
                OrchestratorState::AwaitingModel => {
                    round += 1;
                    self.await_model(conversation, model, &options, round).await?
                }
                OrchestratorState::DispatchingTools(calls) => {
                    self.dispatch(conversation, calls).await?;
                    OrchestratorState::AwaitingModel
                }
                OrchestratorState::Completed(text) => {
                    log_debug!(self.logger, "[Orchestrator] Completed after {} round(s)", round);
                    return Ok(text);
                }
            };
        }
    }

    /// One completion call and the transition it implies
    pub async fn await_model(
        &self,
        conversation: &mut ConversationState,
        model: &str,
        options: &CompletionOptions,
        round: usize,
    ) -> BackendResult<OrchestratorState> {
        debug_log!(
            "round {} -> {} with {} messages",
            round,
            self.provider.name(),
            conversation.len()
        );

        let completion = self
            .provider
            .complete(conversation.messages(), model, options)
            .await?;

        match completion.finish_reason {
            FinishReason::Stop => {
                let text = completion.message.content.clone();
                conversation.push(completion.message);
                Ok(OrchestratorState::Completed(text))
            }
            FinishReason::ToolCalls => {
                if completion.message.tool_calls.is_empty() {
                    return Err(BackendError::EmptyToolCalls);
                }
                let calls = completion.message.tool_calls.clone();
                log_info!(
                    self.logger,
                    "[Orchestrator] Model requested {} tool call(s): {}",
                    calls.len(),
                    calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
                );
                conversation.push(completion.message);
                Ok(OrchestratorState::DispatchingTools(calls))
            }
            other => {
                log_warn!(self.logger, "[Orchestrator] Unsupported finish reason: {}", other);
                Err(BackendError::UnsupportedFinishReason(other))
            }
        }
    }

    /// Run each call in order and append its result
    ///
    /// An unknown tool aborts the batch; results already appended stay.
    pub async fn dispatch(
        &self,
        conversation: &mut ConversationState,
        calls: Vec<ToolCall>,
    ) -> BackendResult<()> {
        for call in &calls {
            let result = self.registry.execute_tool_call(call).await?;
            debug_log!("tool {} ({}) -> {}", call.name, call.id, result.content);
            conversation.push(ChatMessage::tool(result.call_id, result.content));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::providers::MockProvider;
    use crate::tools::{ToolHandler, ToolInfo};
    use crate::types::{ChatCompletion, HistoryRetention, MessageRole, ToolArguments};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl ToolHandler for Fixed {
        async fn call(&self, _args: &ToolArguments) -> String {
            self.0.to_string()
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        registry.register(
            ToolInfo::new("OpenTaskManager", "Open the Windows Task Manager", "system"),
            Arc::new(Fixed("Task Manager has been opened successfully.")),
        );
        registry.register(
            ToolInfo::new("GetGpuMemoryUtilization", "GPU", "system"),
            Arc::new(Fixed("GPU 0: Total: 1 MiB, Used: 0 MiB, Free: 1 MiB\n")),
        );
        Arc::new(registry)
    }

    fn orchestrator(script: Vec<ChatCompletion>) -> (Orchestrator, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::scripted(script, Arc::new(NoOpLogger)));
        let orchestrator = Orchestrator::new(provider.clone(), registry(), Arc::new(NoOpLogger));
        (orchestrator, provider)
    }

    fn conversation() -> ConversationState {
        ConversationState::new(HistoryRetention::PerRequest)
    }

    #[tokio::test]
    async fn test_stop_on_first_round() {
        let (orchestrator, provider) = orchestrator(vec![ChatCompletion::stop("Hello")]);
        let mut conv = conversation();

        let text = orchestrator.run(&mut conv, "qwen3", "hi").await.unwrap();
        assert_eq!(text, "Hello");
        assert_eq!(conv.len(), 2);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.requests()[0].tool_names().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_round_then_stop() {
        let (orchestrator, provider) = orchestrator(vec![
            ChatCompletion::tool_calls(vec![ToolCall::new("call_1", "OpenTaskManager", "")]),
            ChatCompletion::stop("I've opened Task Manager for you."),
        ]);
        let mut conv = conversation();

        let text = orchestrator
            .run(&mut conv, "qwen3", "Please open the Windows task manager?")
            .await
            .unwrap();
        assert_eq!(text, "I've opened Task Manager for you.");

        let roles: Vec<MessageRole> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool, MessageRole::Assistant]
        );
        assert!(conv.tool_results_correlated());

        // The second call sees the tool result
        let second = &provider.requests()[1];
        let tool_msg = second.messages.last().unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.content, "Task Manager has been opened successfully.");
    }

    #[tokio::test]
    async fn test_batch_runs_in_issuance_order() {
        let (orchestrator, _) = orchestrator(vec![
            ChatCompletion::tool_calls(vec![
                ToolCall::new("b", "GetGpuMemoryUtilization", "{}"),
                ToolCall::new("a", "OpenTaskManager", "{}"),
            ]),
            ChatCompletion::stop("done"),
        ]);
        let mut conv = conversation();
        orchestrator.run(&mut conv, "m", "status").await.unwrap();

        let ids: Vec<&str> = conv
            .messages()
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_multiple_rounds() {
        let (orchestrator, provider) = orchestrator(vec![
            ChatCompletion::tool_calls(vec![ToolCall::new("1", "OpenTaskManager", "{}")]),
            ChatCompletion::tool_calls(vec![ToolCall::new("2", "GetGpuMemoryUtilization", "{}")]),
            ChatCompletion::stop("all done"),
        ]);
        let mut conv = conversation();

        assert_eq!(orchestrator.run(&mut conv, "m", "go").await.unwrap(), "all done");
        assert_eq!(provider.call_count(), 3);
        assert!(conv.tool_results_correlated());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fatal() {
        let (orchestrator, provider) = orchestrator(vec![
            ChatCompletion::tool_calls(vec![ToolCall::new("x", "FormatDisk", "{}")]),
            ChatCompletion::stop("never"),
        ]);
        let mut conv = conversation();

        let err = orchestrator.run(&mut conv, "m", "format").await.unwrap_err();
        assert!(matches!(err, BackendError::UnknownTool(ref n) if n == "FormatDisk"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_finish_reasons_are_fatal() {
        for reason in [
            FinishReason::Length,
            FinishReason::ContentFilter,
            FinishReason::FunctionCall,
            FinishReason::Other("eos".to_string()),
        ] {
            let completion = ChatCompletion::new(reason.clone(), ChatMessage::assistant("partial"));
            let (orchestrator, _) = orchestrator(vec![completion]);
            let err = orchestrator.run(&mut conversation(), "m", "hi").await.unwrap_err();
            assert!(matches!(err, BackendError::UnsupportedFinishReason(r) if r == reason));
        }
    }

    #[tokio::test]
    async fn test_empty_tool_call_batch_is_fatal() {
        let (orchestrator, _) = orchestrator(vec![ChatCompletion::tool_calls(vec![])]);
        let err = orchestrator.run(&mut conversation(), "m", "hi").await.unwrap_err();
        assert!(matches!(err, BackendError::EmptyToolCalls));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockProvider::error("offline", Arc::new(NoOpLogger)));
        let orchestrator = Orchestrator::new(provider, registry(), Arc::new(NoOpLogger));
        let err = orchestrator.run(&mut conversation(), "m", "hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Provider(_)));
    }
}
