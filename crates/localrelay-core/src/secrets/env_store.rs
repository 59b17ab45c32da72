//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Mapping from backend secret names to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("lmstudio", vec!["LMSTUDIO_API_KEY", "LM_API_TOKEN"]);
    m.insert("foundry", vec!["FOUNDRY_LOCAL_API_KEY"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("ollama", vec![]); // Ollama doesn't need an API key
    m
});

/// Secret store that reads from environment variables
///
/// Read-only. Lookups try, in order: the key as a variable name, the mapped
/// variables for a backend secret name, then `{KEY}_API_KEY`.
///
/// # Mapping
///
/// - `lmstudio` → `LMSTUDIO_API_KEY` or `LM_API_TOKEN`
/// - `foundry` → `FOUNDRY_LOCAL_API_KEY`
/// - `openai` → `OPENAI_API_KEY`
///
/// # Example
///
/// ```
/// use localrelay_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// let key = store.get("lmstudio");
/// ```
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    /// Create a new environment variable secret store
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Get the environment variable names for a secret name
    pub fn get_env_vars_for(name: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(name.to_lowercase().as_str()).map(|v| v.as_slice())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = non_empty_var(key) {
            return Some(value);
        }

        if let Some(env_vars) = Self::get_env_vars_for(key) {
            if let Some(value) = env_vars.iter().find_map(|v| non_empty_var(v)) {
                return Some(value);
            }
        }

        non_empty_var(&format!("{}_API_KEY", key.to_uppercase()))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}
