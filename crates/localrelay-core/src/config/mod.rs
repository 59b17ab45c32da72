//! Configuration loading
//!
//! `FileConfigProvider` reads one YAML layer (user, workspace or an
//! explicit path). `ConfigResolver` layers them over the built-in defaults.

mod error;
mod file;
mod settings;
mod resolver;

pub use error::{ConfigError, ConfigResult};
pub use file::{FileConfigProvider, ConfigFile, ConfigLevel};
pub use settings::{
    default_backends, default_routes, CommandSpec, RelaySettings, ToolSettings,
    DEFAULT_ADMIN_MODEL, DEFAULT_BIND_ADDRESS, DEFAULT_CHAT_MODEL,
};
pub use resolver::{ConfigResolver, RelayConfig, BIND_ADDRESS_ENV, CONFIG_PATH_ENV};
