//! Backend error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderError;
use crate::tools::ToolError;
use crate::types::FinishReason;

/// Fatal errors while answering a request
///
/// None of these are retried; the dispatcher turns them into a failed
/// response.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A required component was never set up (no active model, no manager)
    #[error("{0} is not initialized")]
    NotInitialized(String),

    /// The model stopped for a reason the orchestrator cannot continue from
    #[error("Unsupported finish reason: {0}")]
    UnsupportedFinishReason(FinishReason),

    /// The model asked for a tool that is not registered or is disabled
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Finish reason was tool_calls but the call list was empty
    #[error("Model reported tool_calls without any tool call")]
    EmptyToolCalls,

    /// Starting the backend's model failed
    #[error("Failed to start model {model}: {source}")]
    ModelStart {
        model: String,
        #[source]
        source: ProviderError,
    },

    /// The chat provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Routing configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ToolError> for BackendError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(name) => BackendError::UnknownTool(name),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
