//! Request classification to backend routing
//!
//! The router owns one long-lived backend per configured backend name and
//! maps every classification tag to one of them. Backends are built eagerly;
//! a manager-backed backend starts its model during `build()`, which can
//! take as long as the model load does.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::{BackendError, BackendResult, ModelBackend, SimpleBackend, ToolCallingBackend};
use crate::config::RelayConfig;
use crate::logging::Logger;
use crate::providers::{create_model_manager, create_provider, ChatProvider, ModelManager};
use crate::secrets::{resolve_api_key, ChainSecretStore, SecretStore};
use crate::state::ActiveModelState;
use crate::tools::{builtin_registry, ToolRegistry};
use crate::types::{BackendConfig, BackendKind, ModelInfo};
use crate::{log_debug, log_info, log_warn};

/// Maps classification tags to backends
pub struct BackendRouter {
    routes: HashMap<String, Arc<dyn ModelBackend>>,
    logger: Arc<dyn Logger>,
}

impl BackendRouter {
    /// Create a router with no routes
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            routes: HashMap::new(),
            logger,
        }
    }

    /// Route a tag to an already-built backend
    pub fn with_route(mut self, tag: impl Into<String>, backend: Arc<dyn ModelBackend>) -> Self {
        self.routes.insert(tag.into(), backend);
        self
    }

    /// Start building a router from configuration
    pub fn builder(
        config: &RelayConfig,
        state: ActiveModelState,
        logger: Arc<dyn Logger>,
    ) -> BackendRouterBuilder {
        BackendRouterBuilder::new(config.clone(), state, logger)
    }

    /// The backend serving a tag
    pub fn backend_for(&self, tag: &str) -> Option<Arc<dyn ModelBackend>> {
        self.routes.get(tag).cloned()
    }

    /// Routed tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.routes.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Answer a request with the backend for its tag
    ///
    /// An unrouted tag yields empty text rather than an error.
    pub async fn route(&self, tag: &str, text: &str) -> BackendResult<String> {
        match self.routes.get(tag) {
            Some(backend) => {
                log_debug!(self.logger, "[Router] {} -> {} ({})", tag, backend.name(), backend.kind());
                backend.respond(text).await
            }
            None => {
                log_warn!(self.logger, "[Router] No backend routed for request type '{}'", tag);
                Ok(String::new())
            }
        }
    }
}

impl std::fmt::Debug for BackendRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRouter")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Builds backends from configuration
///
/// Providers and managers are created from each backend's provider id unless
/// an override is registered for that id.
pub struct BackendRouterBuilder {
    config: RelayConfig,
    state: ActiveModelState,
    logger: Arc<dyn Logger>,
    secrets: Arc<dyn SecretStore>,
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    managers: HashMap<String, Arc<dyn ModelManager>>,
}

impl BackendRouterBuilder {
    fn new(config: RelayConfig, state: ActiveModelState, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            state,
            logger,
            secrets: Arc::new(ChainSecretStore::default()),
            providers: HashMap::new(),
            managers: HashMap::new(),
        }
    }

    /// Use a specific secret store for API keys
    pub fn with_secrets(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Use this chat provider for every backend with the given provider id
    pub fn with_provider(mut self, provider_id: &str, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(provider_id.to_lowercase(), provider);
        self
    }

    /// Use this model manager for every backend with the given provider id
    pub fn with_manager(mut self, provider_id: &str, manager: Arc<dyn ModelManager>) -> Self {
        self.managers.insert(provider_id.to_lowercase(), manager);
        self
    }

    /// Validate the configuration and build every routed backend
    pub async fn build(self) -> BackendResult<BackendRouter> {
        self.config.validate()?;

        let registry = Arc::new(builtin_registry(
            &self.config.tools,
            self.state.clone(),
            Arc::clone(&self.logger),
        ));

        let mut backends: HashMap<String, Arc<dyn ModelBackend>> = HashMap::new();
        for config in self.config.routed_backends() {
            let backend = self.build_backend(config, &registry).await?;
            backends.insert(config.name.to_lowercase(), backend);
        }

        let mut router = BackendRouter::new(Arc::clone(&self.logger));
        for route in &self.config.routes {
            // validate() guarantees every route names a built backend
            if let Some(backend) = backends.get(&route.backend.to_lowercase()) {
                log_info!(self.logger, "[Router] {} -> {}", route.tag, backend.name());
                router = router.with_route(route.tag.clone(), Arc::clone(backend));
            }
        }

        Ok(router)
    }

    async fn build_backend(
        &self,
        config: &BackendConfig,
        registry: &Arc<ToolRegistry>,
    ) -> BackendResult<Arc<dyn ModelBackend>> {
        let provider_id = config.provider.to_lowercase();
        let api_key = resolve_api_key(self.secrets.as_ref(), config.api_key_secret.as_deref());

        log_info!(
            self.logger,
            "[Router] Starting backend {} ({}, provider {}, model {})",
            config.name,
            config.kind,
            config.provider,
            config.model
        );

        let manager = self.managers.get(&provider_id).cloned().or_else(|| {
            create_model_manager(
                &config.provider,
                config.api_base.as_deref(),
                api_key.clone(),
                Arc::clone(&self.logger),
            )
        });

        let (provider, model) = match manager {
            Some(manager) => {
                let info = manager
                    .start_model(&config.model)
                    .await
                    .map_err(|source| BackendError::ModelStart {
                        model: config.model.clone(),
                        source,
                    })?;
                log_info!(self.logger, "[Router] Model {} started as {}", config.model, info.id);

                self.state.attach_manager(Arc::clone(&manager));
                self.state.set_active(info.clone());

                let provider = self.providers.get(&provider_id).cloned().unwrap_or_else(|| {
                    create_provider(
                        &config.provider,
                        Some(&manager.endpoint()),
                        manager.api_key(),
                        Arc::clone(&self.logger),
                    )
                });
                (provider, info.id)
            }
            None => {
                let provider = self.providers.get(&provider_id).cloned().unwrap_or_else(|| {
                    create_provider(
                        &config.provider,
                        config.api_base.as_deref(),
                        api_key,
                        Arc::clone(&self.logger),
                    )
                });
                (provider, config.model.clone())
            }
        };

        let retention = config.effective_retention();
        let backend: Arc<dyn ModelBackend> = match config.kind {
            BackendKind::ToolCalling => Arc::new(ToolCallingBackend::new(
                config.name.clone(),
                model,
                provider,
                Arc::clone(registry),
                retention,
                Arc::clone(&self.logger),
            )),
            BackendKind::Simple => {
                if self.state.active().is_none() {
                    self.state.set_active(ModelInfo::new(model.clone(), model));
                }
                Arc::new(SimpleBackend::new(
                    config.name.clone(),
                    provider,
                    self.state.clone(),
                    retention,
                    Arc::clone(&self.logger),
                ))
            }
        };

        Ok(backend)
    }
}
