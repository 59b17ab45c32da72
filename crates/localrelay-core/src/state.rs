//! Process-wide active model state
//!
//! Shared between the manager-backed backend, which starts a model at
//! construction, the model tools, which switch or load models, and the simple
//! backend, which reads the active model id on every request.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::providers::ModelManager;
use crate::types::ModelInfo;

#[derive(Default)]
struct Inner {
    manager: Option<Arc<dyn ModelManager>>,
    active: Option<ModelInfo>,
}

/// Handle to the active model and its manager
///
/// Cloning is cheap; all clones see the same state.
#[derive(Clone, Default)]
pub struct ActiveModelState {
    inner: Arc<RwLock<Inner>>,
}

impl ActiveModelState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the model manager
    pub fn attach_manager(&self, manager: Arc<dyn ModelManager>) {
        self.inner.write().manager = Some(manager);
    }

    /// The attached model manager, if any
    pub fn manager(&self) -> Option<Arc<dyn ModelManager>> {
        self.inner.read().manager.clone()
    }

    /// Set the active model
    pub fn set_active(&self, info: ModelInfo) {
        self.inner.write().active = Some(info);
    }

    /// The active model, if any
    pub fn active(&self) -> Option<ModelInfo> {
        self.inner.read().active.clone()
    }

    /// Id of the active model, if any
    pub fn active_model_id(&self) -> Option<String> {
        self.inner.read().active.as_ref().map(|m| m.id.clone())
    }
}

impl std::fmt::Debug for ActiveModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ActiveModelState")
            .field("has_manager", &inner.manager.is_some())
            .field("active", &inner.active)
            .finish()
    }
}
