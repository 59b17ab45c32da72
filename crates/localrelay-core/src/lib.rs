//! LocalRelay Core
//!
//! Routes classified natural-language requests to local language-model
//! backends. One backend runs a tool-calling loop that lets the model act on
//! the machine (process control, model catalog queries, GPU telemetry);
//! another answers plainly with whichever model is currently active.
//!
//! ## Request flow
//!
//! ```text
//! RelayRequest ─▶ RelayRequestDispatcher ─▶ BackendRouter ─▶ ModelBackend
//!                  (decode envelope)         (tag lookup)      │
//!                                                              ├─ ToolCallingBackend ─▶ Orchestrator ◀─▶ ToolRegistry
//!                                                              └─ SimpleBackend ─▶ ActiveModelState
//! ```
//!
//! ```rust,ignore
//! use localrelay_core::{BackendRouter, RelayRequestDispatcher, RelayRequest};
//!
//! let config = ConfigResolver::new().resolve()?;
//! let router = BackendRouter::builder(&config, ActiveModelState::new(), logger.clone())
//!     .build()
//!     .await?;
//! let dispatcher = RelayRequestDispatcher::new(Arc::new(router), logger);
//!
//! let response = dispatcher
//!     .dispatch(&RelayRequest::post(r#"{"Type":"ChatCompletion","Text":"Hi"}"#))
//!     .await;
//! ```

pub mod types;
pub mod logging;
pub mod secrets;
pub mod config;
pub mod providers;
pub mod state;
pub mod conversation;
pub mod tools;
pub mod orchestrator;
pub mod backends;
pub mod router;
pub mod dispatcher;

// Re-export commonly used types
pub use types::{
    BackendConfig, BackendKind, ChatCompletion, ChatMessage, FinishReason, HistoryRetention,
    MessageRole, ModelInfo, RouteConfig, Tool, ToolCall, ToolChoice, ToolResult,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger};

pub use secrets::{ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretStore};

pub use config::{ConfigResolver, RelayConfig};

pub use providers::{ChatProvider, ModelManager, ProviderError};

pub use state::ActiveModelState;
pub use conversation::ConversationState;
pub use tools::{ToolInfo, ToolRegistry};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use backends::{BackendError, BackendResult, ModelBackend};
pub use router::{BackendRouter, BackendRouterBuilder};
pub use dispatcher::{
    RelayRequest, RelayRequestDispatcher, RelayResponse, RelayStatus, RequestEnvelope,
};
