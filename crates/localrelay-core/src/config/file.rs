//! File-based configuration layer (YAML)
//!
//! Supports user-level (~/.config/localrelay/config.yaml) and workspace-level (.config/localrelay/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::Deserialize;

use crate::types::{BackendConfig, ConfigSource, RouteConfig};
use super::error::ConfigResult;
use super::settings::{RelaySettings, ToolSettings};

/// Configuration file structure
///
/// Every section is optional; absent sections fall through to the next
/// layer down when configs are resolved.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Listener settings
    #[serde(default)]
    pub relay: Option<RelaySettings>,

    /// Configured backends
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Classification tag routes
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: Option<ToolSettings>,
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/localrelay/config.yaml)
    User,
    /// Workspace-level config (.config/localrelay/config.yaml in workspace root)
    Workspace,
    /// Explicit path (LOCALRELAY_CONFIG)
    Explicit,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::Explicit => "explicit",
        }
    }

    fn source(&self) -> ConfigSource {
        match self {
            ConfigLevel::User => ConfigSource::NativeUser,
            ConfigLevel::Workspace => ConfigSource::NativeWorkspace,
            ConfigLevel::Explicit => ConfigSource::Runtime,
        }
    }
}

/// One YAML configuration layer
///
/// The file is read once and cached until `reload`. A missing file is an
/// empty layer.
///
/// # Example
///
/// ```no_run
/// use localrelay_core::config::FileConfigProvider;
///
/// // User-level config
/// let user_config = FileConfigProvider::user();
///
/// // Workspace-level config
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/localrelay/config.yaml)
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("localrelay").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/localrelay/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("localrelay").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the file; a missing or blank file is an empty layer
    fn load(&self) -> ConfigResult<ConfigFile> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }

        let mut config: ConfigFile = serde_yaml::from_str(&content)?;
        for backend in &mut config.backends {
            backend.source = self.level.source();
        }
        Ok(config)
    }

    /// Get cached or load config
    pub fn get_config(&self) -> ConfigResult<ConfigFile> {
        let cached = self.cache.read().clone();
        match cached {
            Some(config) => Ok(config),
            None => self.reload(),
        }
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}
