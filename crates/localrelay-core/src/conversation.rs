//! Per-backend conversation history

use crate::types::{ChatMessage, HistoryRetention, MessageRole};

/// Ordered, append-only message history owned by one backend
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    retention: HistoryRetention,
}

impl ConversationState {
    /// Create an empty conversation with a retention policy
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            messages: Vec::new(),
            retention,
        }
    }

    /// The retention policy
    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }

    /// Start a top-level request, clearing history when retention is per-request
    pub fn begin_request(&mut self) {
        if self.retention == HistoryRetention::PerRequest {
            self.messages.clear();
        }
    }

    /// Append a message
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages in order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Roll back to an earlier length, discarding the turns of a failed request
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Text of the most recent assistant message
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.text())
    }

    /// Check that every tool message answers a call of the closest preceding
    /// assistant message, and that no call id is answered twice.
    pub fn tool_results_correlated(&self) -> bool {
        let mut pending: Vec<&str> = Vec::new();
        for message in &self.messages {
            match message.role {
                MessageRole::Assistant => {
                    pending = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
                }
                MessageRole::Tool => {
                    let Some(id) = message.tool_call_id.as_deref() else {
                        return false;
                    };
                    match pending.iter().position(|p| *p == id) {
                        Some(idx) => {
                            pending.remove(idx);
                        }
                        None => return false,
                    }
                }
                _ => pending.clear(),
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    fn tool_round() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("open task manager"),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![
                    ToolCall::new("a", "OpenTaskManager", "{}"),
                    ToolCall::new("b", "GetGpuMemoryUtilization", "{}"),
                ],
            ),
            ChatMessage::tool("a", "opened"),
            ChatMessage::tool("b", "GPU 0: ..."),
            ChatMessage::assistant("Done"),
        ]
    }

    #[test]
    fn test_per_request_clears() {
        let mut conv = ConversationState::new(HistoryRetention::PerRequest);
        conv.push(ChatMessage::user("one"));
        conv.begin_request();
        assert!(conv.is_empty());
    }

    #[test]
    fn test_accumulate_keeps_history() {
        let mut conv = ConversationState::new(HistoryRetention::Accumulate);
        conv.push(ChatMessage::user("one"));
        conv.push(ChatMessage::assistant("1"));
        conv.begin_request();
        conv.push(ChatMessage::user("two"));
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last_assistant_text(), Some("1"));
    }

    #[test]
    fn test_truncate_drops_partial_round() {
        let mut conv = ConversationState::new(HistoryRetention::Accumulate);
        conv.push(ChatMessage::user("one"));
        conv.push(ChatMessage::assistant("1"));
        let mark = conv.len();

        conv.push(ChatMessage::user("format it"));
        conv.push(ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("x", "FormatDisk", "{}")],
        ));
        conv.truncate(mark);

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last_assistant_text(), Some("1"));
        assert!(conv.tool_results_correlated());
    }

    #[test]
    fn test_correlation_holds_for_tool_round() {
        let mut conv = ConversationState::new(HistoryRetention::PerRequest);
        for m in tool_round() {
            conv.push(m);
        }
        assert!(conv.tool_results_correlated());
        assert_eq!(conv.last_assistant_text(), Some("Done"));
    }

    #[test]
    fn test_correlation_rejects_unrequested_id() {
        let mut conv = ConversationState::new(HistoryRetention::PerRequest);
        conv.push(ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("a", "OpenTaskManager", "{}")],
        ));
        conv.push(ChatMessage::tool("z", "opened"));
        assert!(!conv.tool_results_correlated());
    }

    #[test]
    fn test_correlation_rejects_duplicate_answer() {
        let mut conv = ConversationState::new(HistoryRetention::PerRequest);
        conv.push(ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("a", "OpenTaskManager", "{}")],
        ));
        conv.push(ChatMessage::tool("a", "opened"));
        conv.push(ChatMessage::tool("a", "opened again"));
        assert!(!conv.tool_results_correlated());
    }
}
