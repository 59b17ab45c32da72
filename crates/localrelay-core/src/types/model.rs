//! Model and backend configuration types

use serde::{Deserialize, Serialize};

/// Information about a model known to the model manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Full model identifier (used for chat completions)
    #[serde(rename = "name", alias = "id")]
    pub id: String,
    /// Short alias (e.g. "phi-4-mini")
    #[serde(default)]
    pub alias: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Task the model is built for (e.g. "chat-completion")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Download size in megabytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<u64>,
    /// Execution runtime details as reported by the manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<serde_json::Value>,
}

impl ModelInfo {
    /// Create model info from an id and alias
    pub fn new(id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: alias.into(),
            display_name: None,
            task: None,
            file_size_mb: None,
            runtime: None,
        }
    }

    /// Whether this model answers to an id or alias
    pub fn matches(&self, alias_or_id: &str) -> bool {
        self.id.eq_ignore_ascii_case(alias_or_id) || self.alias.eq_ignore_ascii_case(alias_or_id)
    }
}

/// How a backend produces answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Runs the tool-calling loop against the tool registry
    ToolCalling,
    /// One completion per request, no tools
    Simple,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::ToolCalling => write!(f, "tool_calling"),
            BackendKind::Simple => write!(f, "simple"),
        }
    }
}

/// What a backend keeps of its conversation between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRetention {
    /// History is cleared at the start of every request
    PerRequest,
    /// History accumulates for the lifetime of the process
    Accumulate,
}

impl HistoryRetention {
    /// Default retention for a backend kind
    pub fn default_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::ToolCalling => HistoryRetention::PerRequest,
            BackendKind::Simple => HistoryRetention::Accumulate,
        }
    }
}

/// Where a backend configuration came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// From user-level config (~/.config/localrelay/config.yaml)
    NativeUser,
    /// From workspace-level config (.config/localrelay/config.yaml)
    NativeWorkspace,
    /// From an explicit path or the environment
    Runtime,
    /// Unknown source
    Unknown,
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource::Unknown
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "Built-in defaults"),
            ConfigSource::NativeUser => write!(f, "~/.config/localrelay/config.yaml"),
            ConfigSource::NativeWorkspace => write!(f, ".config/localrelay/config.yaml"),
            ConfigSource::Runtime => write!(f, "Runtime"),
            ConfigSource::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name referenced by routes
    pub name: String,
    /// Tool-calling or simple
    pub kind: BackendKind,
    /// Chat provider id ("openai", "foundry", "mock")
    pub provider: String,
    /// Model id (OpenAI-compatible servers) or alias (Foundry Local)
    pub model: String,
    /// Custom API base URL (chat endpoint, or the Foundry Local service URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Secret store key holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_secret: Option<String>,
    /// History retention (defaults per kind)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<HistoryRetention>,
    /// Whether this backend is enabled (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Where this config came from (not serialized to file)
    #[serde(skip)]
    pub source: ConfigSource,
}

fn default_enabled() -> bool {
    true
}

impl BackendConfig {
    /// Create a new backend configuration
    pub fn new(
        name: impl Into<String>,
        kind: BackendKind,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            provider: provider.into(),
            model: model.into(),
            api_base: None,
            api_key_secret: None,
            retention: None,
            enabled: true,
            source: ConfigSource::Unknown,
        }
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the secret key for the API key
    pub fn with_api_key_secret(mut self, key: impl Into<String>) -> Self {
        self.api_key_secret = Some(key.into());
        self
    }

    /// Set the history retention
    pub fn with_retention(mut self, retention: HistoryRetention) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Disable the backend
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the source of this configuration
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    /// Effective history retention
    pub fn effective_retention(&self) -> HistoryRetention {
        self.retention
            .unwrap_or_else(|| HistoryRetention::default_for(self.kind))
    }
}

/// Maps a request classification tag to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Classification tag from the request envelope ("AdminTask", ...)
    pub tag: String,
    /// Backend name
    pub backend: String,
}

impl RouteConfig {
    pub fn new(tag: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            backend: backend.into(),
        }
    }
}
