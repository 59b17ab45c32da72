//! Core types for LLM interactions
//!
//! This module contains all the shared types used across providers,
//! backends and tools.

mod message;
mod model;
mod tool;
mod completion;

pub use message::{ChatMessage, MessageRole};
pub use model::{
    BackendConfig, BackendKind, ConfigSource, HistoryRetention, ModelInfo, RouteConfig,
};
pub use tool::{Tool, ToolArguments, ToolCall, ToolChoice, ToolResult};
pub use completion::{ChatCompletion, FinishReason};
