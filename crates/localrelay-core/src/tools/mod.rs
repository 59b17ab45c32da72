//! Tool management module
//!
//! This module provides tool registration, filtering, and execution for LLM
//! tool calling. Tools are local functions the tool-calling backend may ask
//! the model to invoke.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistry                               │
//! │                                             │
//! │  - Holds handlers registered at startup     │
//! │  - Filters disabled tools                   │
//! │  - Provides tool schemas to the LLM         │
//! │  - Executes tool calls by name              │
//! └─────────────────────────────────────────────┘
//!           │
//!           ├── system: OpenTaskManager, GetGpuMemoryUtilization
//!           │
//!           └── models: ListCatalogModels, ListLoadedModels,
//!                       SetActiveModel, LoadModel
//!                       (via the manager in ActiveModelState)
//! ```

mod registry;
mod system;
mod models;

pub use registry::{
    ToolError, ToolHandler, ToolInfo, ToolRegistry, ToolRegistryResult,
};
pub use system::{
    format_gpu_memory, GpuMemoryTool, OpenTaskManagerTool, GET_GPU_MEMORY_UTILIZATION,
    OPEN_TASK_MANAGER,
};
pub use models::{
    ListModelsTool, LoadModelTool, ModelListing, SetActiveModelTool, LIST_CATALOG_MODELS,
    LIST_LOADED_MODELS, LOAD_MODEL, MODEL_ALIAS_ARG, SET_ACTIVE_MODEL,
};

use std::sync::Arc;

use serde_json::json;

use crate::config::ToolSettings;
use crate::logging::Logger;
use crate::state::ActiveModelState;

fn model_alias_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "modelAlias": {
                "type": "string",
                "description": description
            }
        },
        "required": ["modelAlias"]
    })
}

/// Registry holding the six built-in tools, with disabled tools switched off
pub fn builtin_registry(
    settings: &ToolSettings,
    state: ActiveModelState,
    logger: Arc<dyn Logger>,
) -> ToolRegistry {
    let registry = ToolRegistry::new(Arc::clone(&logger));

    registry.register(
        ToolInfo::new(OPEN_TASK_MANAGER, "Open the Windows Task Manager", "system"),
        Arc::new(OpenTaskManagerTool::new(
            settings.task_manager.clone(),
            Arc::clone(&logger),
        )),
    );
    registry.register(
        ToolInfo::new(
            LIST_CATALOG_MODELS,
            "Lists the available models in the Azure Foundry Local catalog.",
            "models",
        ),
        Arc::new(ListModelsTool::new(ModelListing::Catalog, state.clone())),
    );
    registry.register(
        ToolInfo::new(
            LIST_LOADED_MODELS,
            "Lists the currently loaded models in Azure Foundry Local.",
            "models",
        ),
        Arc::new(ListModelsTool::new(ModelListing::Loaded, state.clone())),
    );
    registry.register(
        ToolInfo::new(
            SET_ACTIVE_MODEL,
            "Sets the model that is currently active in Foundry Local.",
            "models",
        )
        .with_schema(model_alias_schema("The alias of the model to set as active.")),
        Arc::new(SetActiveModelTool::new(state.clone(), Arc::clone(&logger))),
    );
    registry.register(
        ToolInfo::new(LOAD_MODEL, "Loads a model in Azure Foundry Local.", "models")
            .with_schema(model_alias_schema("The alias of the model to be loaded.")),
        Arc::new(LoadModelTool::new(state, Arc::clone(&logger))),
    );
    registry.register(
        ToolInfo::new(
            GET_GPU_MEMORY_UTILIZATION,
            "Returns the utilization of the GPUs in the system.",
            "system",
        ),
        Arc::new(GpuMemoryTool::new(settings.gpu_query.clone(), Arc::clone(&logger))),
    );

    for name in &settings.disabled {
        if registry.handler(name).is_none() {
            logger.warn(&format!("[ToolRegistry] Cannot disable unknown tool: {}", name));
            continue;
        }
        registry.set_tool_enabled(name, false);
    }

    logger.info(&format!(
        "[ToolRegistry] {} of {} built-in tools enabled",
        registry.enabled_tool_count(),
        registry.tool_count()
    ));

    registry
}
