//! Model backends
//!
//! A backend owns one conversation and answers requests with it:
//! - `ToolCallingBackend`: runs the orchestrator loop over the tool registry
//! - `SimpleBackend`: one completion per request against the active model
//!
//! Each backend holds its conversation behind an async mutex for the whole
//! request, so concurrent requests to one backend run one after another.

mod error;
mod tool_calling;
mod simple;

pub use error::{BackendError, BackendResult};
pub use tool_calling::ToolCallingBackend;
pub use simple::SimpleBackend;

use async_trait::async_trait;

use crate::types::{BackendKind, ChatMessage};

/// A long-lived answerer for one classification tag
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend name from configuration
    fn name(&self) -> &str;

    /// Tool-calling or simple
    fn kind(&self) -> BackendKind;

    /// Answer one user request
    async fn respond(&self, text: &str) -> BackendResult<String>;

    /// Snapshot of the conversation as it stands
    async fn history(&self) -> Vec<ChatMessage>;
}
