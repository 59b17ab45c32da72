//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::env_store::EnvSecretStore;
use super::memory_store::MemorySecretStore;
use super::traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};

/// Secret stores tried in order
///
/// Reads return the first match. Writes go to the designated write store
/// (the first one unless set otherwise).
///
/// # Example
///
/// ```
/// use localrelay_core::secrets::{SecretStore, ChainSecretStore, EnvSecretStore, MemorySecretStore};
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySecretStore::new());
/// let env = Arc::new(EnvSecretStore::new());
///
/// let chain = ChainSecretStore::new(vec![memory.clone(), env]).unwrap();
/// chain.store("lmstudio", "value").unwrap();
/// ```
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
    write_store_index: usize,
}

impl ChainSecretStore {
    /// Create a chain; the first store takes writes
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> SecretStoreResult<Self> {
        Self::with_write_store(stores, 0)
    }

    /// Create a chain with a specific write store
    pub fn with_write_store(
        stores: Vec<Arc<dyn SecretStore>>,
        write_store_index: usize,
    ) -> SecretStoreResult<Self> {
        if stores.is_empty() {
            return Err(SecretStoreError::EmptyChain);
        }
        if write_store_index >= stores.len() {
            return Err(SecretStoreError::WriteIndex {
                index: write_store_index,
                len: stores.len(),
            });
        }
        Ok(Self {
            stores,
            write_store_index,
        })
    }

    /// Memory overrides in front of the environment
    pub fn with_overrides(overrides: Arc<MemorySecretStore>) -> Self {
        Self {
            stores: vec![overrides, Arc::new(EnvSecretStore::new())],
            write_store_index: 0,
        }
    }

    /// Get the stores in this chain
    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    /// Find which store has a key
    pub fn find_store(&self, key: &str) -> Option<&Arc<dyn SecretStore>> {
        self.stores
            .iter()
            .find(|s| s.is_available() && s.has(key))
    }
}

impl Default for ChainSecretStore {
    fn default() -> Self {
        Self::with_overrides(Arc::new(MemorySecretStore::new()))
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.stores[self.write_store_index].store(key, value)
    }

    /// Remove the key from every writable store that holds it
    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        for store in self.stores.iter().filter(|s| s.has(key)) {
            match store.delete(key) {
                Ok(()) | Err(SecretStoreError::ReadOnly) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        match self.find_store(key) {
            Some(store) => SecretInfo::new(true, store.name()),
            None => SecretInfo::not_found(),
        }
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretStore")
            .field("stores", &names)
            .field("write_store_index", &self.write_store_index)
            .finish()
    }
}
