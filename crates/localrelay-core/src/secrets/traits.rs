//! Secret store trait and error types

use thiserror::Error;

/// Where a secret was found, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    pub available: bool,
    /// Name of the store holding the secret ("none" when missing)
    pub source: String,
}

impl SecretInfo {
    pub fn new(available: bool, source: impl Into<String>) -> Self {
        Self {
            available,
            source: source.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(false, "none")
    }
}

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Secret chain needs at least one store")]
    EmptyChain,

    #[error("Write store index {index} out of bounds for {len} stores")]
    WriteIndex { index: usize, len: usize },

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Lookup of backend API keys
///
/// Backends name their key by secret name (`lmstudio`, `foundry`); the
/// store decides where that name lives.
///
/// # Example
///
/// ```
/// use localrelay_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// // checks LMSTUDIO_API_KEY, then LM_API_TOKEN
/// let _ = store.get("lmstudio");
/// ```
pub trait SecretStore: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the store can be queried at all
    fn is_available(&self) -> bool {
        true
    }

    /// Look up a backend secret name (`foundry`) or a direct variable name
    /// (`FOUNDRY_LOCAL_API_KEY`)
    fn get(&self, key: &str) -> Option<String>;

    /// Fails with `ReadOnly` on stores that cannot be written
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    /// Fails with `ReadOnly` on stores that cannot be written
    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        if self.has(key) {
            SecretInfo::new(true, self.name())
        } else {
            SecretInfo::not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_info() {
        let info = SecretInfo::new(true, "env");
        assert!(info.available);
        assert_eq!(info.source, "env");

        let missing = SecretInfo::not_found();
        assert!(!missing.available);
        assert_eq!(missing.source, "none");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SecretStoreError::WriteIndex { index: 5, len: 1 }.to_string(),
            "Write store index 5 out of bounds for 1 stores"
        );
    }
}
