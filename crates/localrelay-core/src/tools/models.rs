//! Model-manager tools
//!
//! All four tools go through the manager attached to the shared
//! `ActiveModelState`. Without one they report failure text like any other
//! handler error.

use std::sync::Arc;

use async_trait::async_trait;

use crate::logging::Logger;
use crate::providers::{ModelManager, ProviderError};
use crate::state::ActiveModelState;
use crate::types::{ModelInfo, ToolArguments};
use super::registry::ToolHandler;

pub const LIST_CATALOG_MODELS: &str = "ListCatalogModels";
pub const LIST_LOADED_MODELS: &str = "ListLoadedModels";
pub const SET_ACTIVE_MODEL: &str = "SetActiveModel";
pub const LOAD_MODEL: &str = "LoadModel";

/// Argument carrying the model alias
pub const MODEL_ALIAS_ARG: &str = "modelAlias";

fn manager(state: &ActiveModelState) -> Result<Arc<dyn ModelManager>, ProviderError> {
    state
        .manager()
        .ok_or_else(|| ProviderError::Other("model manager is not initialized".to_string()))
}

fn alias_lines(models: &[ModelInfo]) -> String {
    models.iter().map(|m| format!("-{}\n", m.alias)).collect()
}

/// Which listing a `ListModelsTool` produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelListing {
    Catalog,
    Loaded,
}

/// Lists catalog or loaded models as `-alias` lines
pub struct ListModelsTool {
    listing: ModelListing,
    state: ActiveModelState,
}

impl ListModelsTool {
    pub fn new(listing: ModelListing, state: ActiveModelState) -> Self {
        Self { listing, state }
    }

    async fn list(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let manager = manager(&self.state)?;
        match self.listing {
            ModelListing::Catalog => manager.list_catalog_models().await,
            ModelListing::Loaded => manager.list_loaded_models().await,
        }
    }
}

#[async_trait]
impl ToolHandler for ListModelsTool {
    async fn call(&self, _args: &ToolArguments) -> String {
        match (self.listing, self.list().await) {
            (ModelListing::Catalog, Ok(models)) => format!(
                "The models available in the Azure Foundry Local catalog are:\n\n{}",
                alias_lines(&models)
            ),
            (ModelListing::Loaded, Ok(models)) => format!(
                "The models currently loaded in Azure Foundry Local:\n\n{}",
                alias_lines(&models)
            ),
            (ModelListing::Catalog, Err(e)) => format!("Failed to list models in catalog: {}", e),
            (ModelListing::Loaded, Err(e)) => format!("Failed to list loaded models: {}", e),
        }
    }
}

/// Makes a catalog model the active one without loading it
pub struct SetActiveModelTool {
    state: ActiveModelState,
    logger: Arc<dyn Logger>,
}

impl SetActiveModelTool {
    pub fn new(state: ActiveModelState, logger: Arc<dyn Logger>) -> Self {
        Self { state, logger }
    }
}

#[async_trait]
impl ToolHandler for SetActiveModelTool {
    async fn call(&self, args: &ToolArguments) -> String {
        let alias = args.text_or_empty(MODEL_ALIAS_ARG);
        let result = match manager(&self.state) {
            Ok(manager) => manager.get_model_info(&alias).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(info) => {
                self.logger
                    .info(&format!("[Tools] Active model set to {} ({})", alias, info.id));
                self.state.set_active(info);
                format!("The active model has been set to {}", alias)
            }
            Err(e) => format!("Failed to set active model: {}", e),
        }
    }
}

/// Loads a model through the manager and makes it active
pub struct LoadModelTool {
    state: ActiveModelState,
    logger: Arc<dyn Logger>,
}

impl LoadModelTool {
    pub fn new(state: ActiveModelState, logger: Arc<dyn Logger>) -> Self {
        Self { state, logger }
    }
}

#[async_trait]
impl ToolHandler for LoadModelTool {
    async fn call(&self, args: &ToolArguments) -> String {
        let alias = args.text_or_empty(MODEL_ALIAS_ARG);
        let result = match manager(&self.state) {
            Ok(manager) => manager.load_model(&alias).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(info) => {
                self.logger
                    .info(&format!("[Tools] Loaded model {} ({})", alias, info.id));
                self.state.set_active(info);
                format!("The model {} has been loaded and is now active.", alias)
            }
            Err(e) => format!("Failed to load model: {}", e),
        }
    }
}
