//! Relay, tool and route settings with built-in defaults

use serde::{Deserialize, Serialize};

use crate::types::{BackendConfig, BackendKind, ConfigSource, RouteConfig};

/// Default listener address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Model used by the default tool-calling backend
pub const DEFAULT_ADMIN_MODEL: &str = "unsloth/qwen3-30b-a3b-instruct-2507";

/// Model alias started by the default simple backend
pub const DEFAULT_CHAT_MODEL: &str = "phi-4-mini";

/// Listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySettings {
    /// Address the listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Relay namespace, shown in status output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Hybrid connection name, shown in status output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_name: Option<String>,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            namespace: None,
            connection_name: None,
        }
    }
}

impl RelaySettings {
    /// Display name for status lines
    pub fn display_name(&self) -> String {
        match (&self.namespace, &self.connection_name) {
            (Some(ns), Some(conn)) => format!("{}/{}", ns, conn),
            _ => format!("http://{}", self.bind_address),
        }
    }
}

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The task manager launcher for this platform
    pub fn task_manager() -> Self {
        if cfg!(windows) {
            Self::new("taskmgr.exe", &[])
        } else if cfg!(target_os = "macos") {
            Self::new("open", &["-a", "Activity Monitor"])
        } else {
            Self::new("gnome-system-monitor", &[])
        }
    }

    /// The nvidia-smi memory query
    pub fn gpu_query() -> Self {
        Self::new(
            "nvidia-smi",
            &[
                "--query-gpu=memory.total,memory.used,memory.free",
                "--format=csv,nounits,noheader",
            ],
        )
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Built-in tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    /// Command launched by OpenTaskManager
    #[serde(default = "CommandSpec::task_manager")]
    pub task_manager: CommandSpec,
    /// Command run by GetGpuMemoryUtilization
    #[serde(default = "CommandSpec::gpu_query")]
    pub gpu_query: CommandSpec,
    /// Tools that are neither advertised nor dispatchable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            task_manager: CommandSpec::task_manager(),
            gpu_query: CommandSpec::gpu_query(),
            disabled: Vec::new(),
        }
    }
}

impl ToolSettings {
    /// Whether a tool is disabled
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }
}

/// Built-in backends: LM Studio for admin tasks, Foundry Local for chat
pub fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new("lmstudio", BackendKind::ToolCalling, "lmstudio", DEFAULT_ADMIN_MODEL)
            .with_api_key_secret("lmstudio")
            .with_source(ConfigSource::Default),
        BackendConfig::new("foundry", BackendKind::Simple, "foundry", DEFAULT_CHAT_MODEL)
            .with_api_key_secret("foundry")
            .with_source(ConfigSource::Default),
    ]
}

/// Built-in routes
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("AdminTask", "lmstudio"),
        RouteConfig::new("ChatCompletion", "foundry"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let backends = default_backends();
        assert_eq!(backends[0].model, DEFAULT_ADMIN_MODEL);
        assert_eq!(backends[0].kind, BackendKind::ToolCalling);
        assert_eq!(backends[1].model, DEFAULT_CHAT_MODEL);

        let routes = default_routes();
        assert_eq!(routes[0].tag, "AdminTask");
        assert_eq!(routes[1].backend, "foundry");
    }

    #[test]
    fn test_tool_settings_yaml_defaults() {
        let settings: ToolSettings = serde_yaml::from_str("disabled: [OpenTaskManager]").unwrap();
        assert!(settings.is_disabled("OpenTaskManager"));
        assert!(!settings.is_disabled("LoadModel"));
        assert_eq!(settings.gpu_query.program, "nvidia-smi");
    }

    #[test]
    fn test_relay_display_name() {
        let mut relay = RelaySettings::default();
        assert_eq!(relay.display_name(), "http://127.0.0.1:8080");

        relay.namespace = Some("contoso.servicebus.windows.net".into());
        relay.connection_name = Some("localrelay".into());
        assert_eq!(relay.display_name(), "contoso.servicebus.windows.net/localrelay");
    }

    #[test]
    fn test_command_display() {
        assert_eq!(
            CommandSpec::gpu_query().to_string(),
            "nvidia-smi --query-gpu=memory.total,memory.used,memory.free --format=csv,nounits,noheader"
        );
    }
}
