//! Layered configuration resolution
//!
//! Source priority (later sources override earlier):
//! 1. Built-in defaults
//! 2. User config (~/.config/localrelay/config.yaml)
//! 3. Workspace config (.config/localrelay/config.yaml)
//! 4. Explicit file (`LOCALRELAY_CONFIG`)
//! 5. `LOCALRELAY_BIND_ADDRESS`
//!
//! Backends merge by name and routes by tag; `relay` and `tools` sections
//! replace the lower layer wholesale when present.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::types::{BackendConfig, RouteConfig};
use super::file::{ConfigFile, ConfigLevel, FileConfigProvider};
use super::settings::{default_backends, default_routes, RelaySettings, ToolSettings};
use super::error::{ConfigError, ConfigResult};

/// Env var naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "LOCALRELAY_CONFIG";

/// Env var overriding the bind address
pub const BIND_ADDRESS_ENV: &str = "LOCALRELAY_BIND_ADDRESS";

/// Effective configuration after all layers are applied
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub relay: RelaySettings,
    pub backends: Vec<BackendConfig>,
    pub routes: Vec<RouteConfig>,
    pub tools: ToolSettings,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay: RelaySettings::default(),
            backends: default_backends(),
            routes: default_routes(),
            tools: ToolSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Apply one file layer on top of this config
    pub fn merge(&mut self, layer: ConfigFile) {
        if let Some(relay) = layer.relay {
            self.relay = relay;
        }
        if let Some(tools) = layer.tools {
            self.tools = tools;
        }

        for backend in layer.backends {
            match self
                .backends
                .iter_mut()
                .find(|b| b.name.eq_ignore_ascii_case(&backend.name))
            {
                Some(existing) => *existing = backend,
                None => self.backends.push(backend),
            }
        }

        for route in layer.routes {
            match self.routes.iter_mut().find(|r| r.tag == route.tag) {
                Some(existing) => *existing = route,
                None => self.routes.push(route),
            }
        }
    }

    /// Look up an enabled backend by name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends
            .iter()
            .find(|b| b.enabled && b.name.eq_ignore_ascii_case(name))
    }

    /// Every route must point at an enabled backend
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.name.to_lowercase()) {
                return Err(ConfigError::BackendExists(backend.name.clone()));
            }
        }

        for route in &self.routes {
            if self.backend(&route.backend).is_none() {
                return Err(ConfigError::DanglingRoute {
                    tag: route.tag.clone(),
                    backend: route.backend.clone(),
                });
            }
        }
        Ok(())
    }

    /// Enabled backends that at least one route points at
    pub fn routed_backends(&self) -> Vec<&BackendConfig> {
        self.backends
            .iter()
            .filter(|b| b.enabled)
            .filter(|b| {
                self.routes
                    .iter()
                    .any(|r| r.backend.eq_ignore_ascii_case(&b.name))
            })
            .collect()
    }
}

/// Resolves the effective configuration from all sources
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    /// Workspace path for workspace-level config
    pub workspace_path: Option<PathBuf>,
    /// Explicit config file, overriding `LOCALRELAY_CONFIG`
    pub explicit_path: Option<PathBuf>,
    /// Skip the user-level config (tests)
    pub skip_user: bool,
    /// Skip environment overrides (tests)
    pub skip_env: bool,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a workspace path
    pub fn with_workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace_path = Some(path.into());
        self
    }

    /// Use an explicit config file
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Ignore the user config and the environment
    pub fn isolated(mut self) -> Self {
        self.skip_user = true;
        self.skip_env = true;
        self
    }

    fn explicit(&self) -> Option<PathBuf> {
        if self.explicit_path.is_some() {
            return self.explicit_path.clone();
        }
        if self.skip_env {
            return None;
        }
        std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Load every layer and validate the result
    pub fn resolve(&self) -> ConfigResult<RelayConfig> {
        let mut config = RelayConfig::default();

        if !self.skip_user {
            let user = FileConfigProvider::user();
            if user.exists() {
                config.merge(user.get_config()?);
            }
        }

        if let Some(ws_path) = &self.workspace_path {
            let workspace = FileConfigProvider::workspace(ws_path);
            if workspace.exists() {
                config.merge(workspace.get_config()?);
            }
        }

        if let Some(path) = self.explicit() {
            let explicit = FileConfigProvider::new(&path, ConfigLevel::Explicit);
            if !explicit.exists() {
                return Err(ConfigError::Other(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            config.merge(explicit.get_config()?);
        }

        if !self.skip_env {
            if let Ok(addr) = std::env::var(BIND_ADDRESS_ENV) {
                if !addr.trim().is_empty() {
                    config.relay.bind_address = addr.trim().to_string();
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}
