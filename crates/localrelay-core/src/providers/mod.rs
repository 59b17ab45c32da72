//! Chat providers and model managers
//!
//! ## Architecture
//!
//! Backends talk to language models through two capability traits:
//! - `ChatProvider`: one non-streaming chat completion per call
//! - `ModelManager`: catalog queries and model loading (Foundry Local)
//!
//! `OpenAiCompatProvider` covers every local server with an OpenAI-compatible
//! surface. Manager-backed providers get their chat endpoint from the
//! manager once the model is started.
//!
//! The `MockProvider` and `MockModelManager` are kept for testing purposes.

mod traits;
mod error;
mod openai_compat;
mod foundry;
mod mock;

// Core traits and types
pub use traits::{ChatProvider, CompletionOptions, ModelManager};
pub use error::{ProviderError, ProviderResult};

pub use openai_compat::{OpenAiCompatProvider, LM_STUDIO_API_BASE, NO_KEY_REQUIRED};
pub use foundry::{FoundryLocalManager, FOUNDRY_SERVICE_URL};

// Mocks for testing
pub use mock::{MockMode, MockModelManager, MockProvider, RecordedRequest};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a chat provider for the given provider ID
///
/// `api_base` overrides the provider's default endpoint. Unknown ids are
/// treated as OpenAI-compatible servers so custom endpoints work.
pub fn create_provider(
    provider_id: &str,
    api_base: Option<&str>,
    api_key: impl Into<String>,
    logger: Arc<dyn Logger>,
) -> Arc<dyn ChatProvider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Arc::new(MockProvider::echo(logger)),
        "foundry" => Arc::new(OpenAiCompatProvider::new(
            "foundry",
            api_base.map_or_else(|| format!("{}/v1", FOUNDRY_SERVICE_URL), str::to_string),
            api_key,
            logger,
        )),
        _ => Arc::new(OpenAiCompatProvider::new(
            provider_id,
            api_base.unwrap_or(LM_STUDIO_API_BASE),
            api_key,
            logger,
        )),
    }
}

/// Create the model manager for a provider ID, if it has one
pub fn create_model_manager(
    provider_id: &str,
    service_url: Option<&str>,
    api_key: impl Into<String>,
    logger: Arc<dyn Logger>,
) -> Option<Arc<dyn ModelManager>> {
    match provider_id.to_lowercase().as_str() {
        "foundry" => Some(Arc::new(
            FoundryLocalManager::new(service_url.unwrap_or(FOUNDRY_SERVICE_URL), logger)
                .with_api_key(api_key),
        )),
        _ => None,
    }
}
