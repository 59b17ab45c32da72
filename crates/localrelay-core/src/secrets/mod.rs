//! Secret storage abstractions and implementations
//!
//! Backend API keys are looked up by secret name (`api_key_secret` in the
//! backend config) through a `SecretStore`:
//! - `EnvSecretStore`: environment variables
//! - `MemorySecretStore`: in-memory, read-write
//! - `ChainSecretStore`: several stores tried in order

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;

use crate::providers::NO_KEY_REQUIRED;

/// API key for a backend, or the placeholder local servers accept
pub fn resolve_api_key(store: &dyn SecretStore, secret_name: Option<&str>) -> String {
    secret_name
        .and_then(|name| store.get(name))
        .unwrap_or_else(|| NO_KEY_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key() {
        let store = MemorySecretStore::with_secrets([("lmstudio", "lm-key")]);
        assert_eq!(resolve_api_key(&store, Some("lmstudio")), "lm-key");
        assert_eq!(resolve_api_key(&store, Some("foundry")), NO_KEY_REQUIRED);
        assert_eq!(resolve_api_key(&store, None), NO_KEY_REQUIRED);
    }
}
