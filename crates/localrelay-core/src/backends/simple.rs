//! Backend with one completion per request and no tools

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::conversation::ConversationState;
use crate::logging::Logger;
use crate::providers::{ChatProvider, CompletionOptions};
use crate::state::ActiveModelState;
use crate::types::{BackendKind, ChatMessage, HistoryRetention};
use super::{BackendError, BackendResult, ModelBackend};

/// Answers with whatever model is currently active
///
/// The model id is read from `ActiveModelState` on every request, so a
/// `SetActiveModel` or `LoadModel` tool call redirects later requests.
pub struct SimpleBackend {
    name: String,
    provider: Arc<dyn ChatProvider>,
    state: ActiveModelState,
    conversation: Mutex<ConversationState>,
    logger: Arc<dyn Logger>,
}

impl SimpleBackend {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn ChatProvider>,
        state: ActiveModelState,
        retention: HistoryRetention,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            state,
            conversation: Mutex::new(ConversationState::new(retention)),
            logger,
        }
    }
}

#[async_trait]
impl ModelBackend for SimpleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Simple
    }

    async fn respond(&self, text: &str) -> BackendResult<String> {
        let mut conversation = self.conversation.lock().await;
        conversation.begin_request();

        let model = self
            .state
            .active_model_id()
            .ok_or_else(|| BackendError::NotInitialized("active model".to_string()))?;

        let mark = conversation.len();
        conversation.push(ChatMessage::user(text));
        self.logger.debug(&format!(
            "[{}] Completion with model {} over {} messages",
            self.name,
            model,
            conversation.len()
        ));

        let completion = match self
            .provider
            .complete(conversation.messages(), &model, &CompletionOptions::new())
            .await
        {
            Ok(completion) => completion,
            Err(e) => {
                conversation.truncate(mark);
                return Err(e.into());
            }
        };

        let answer = completion.message.content.clone();
        conversation.push(completion.message);
        Ok(answer)
    }

    async fn history(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.messages().to_vec()
    }
}
