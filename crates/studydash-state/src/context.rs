//! Shared collaborators of every store.

use std::sync::Arc;

use studydash_core::{IdentityProvider, Uid};
use studydash_secrets::{CryptoProvider, EphemeralStorage, SealedEntry};

use crate::registry::StoreRegistry;

/// Everything a store needs to persist itself, plus the registry it joins.
///
/// One context per dashboard instance; tests build as many independent ones
/// as they like.
#[derive(Clone)]
pub struct StoreContext {
    crypto: Arc<dyn CryptoProvider>,
    storage: Arc<dyn EphemeralStorage>,
    identity: Arc<dyn IdentityProvider>,
    registry: StoreRegistry,
    namespace: String,
}

impl StoreContext {
    /// Create a context with an empty registry.
    pub fn new(
        crypto: Arc<dyn CryptoProvider>,
        storage: Arc<dyn EphemeralStorage>,
        identity: Arc<dyn IdentityProvider>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            crypto,
            storage,
            identity,
            registry: StoreRegistry::new(),
            namespace: namespace.into(),
        }
    }

    /// Namespaced storage key for `key`.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    /// An encrypted slot under the namespaced `key`.
    pub fn sealed_entry(&self, key: &str) -> SealedEntry {
        SealedEntry::new(
            self.storage_key(key),
            Arc::clone(&self.crypto),
            Arc::clone(&self.storage),
            Arc::clone(&self.identity),
        )
    }

    /// The registry stores join on construction.
    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// The underlying tab storage.
    pub fn storage(&self) -> &Arc<dyn EphemeralStorage> {
        &self.storage
    }

    /// The uid currently signed in.
    pub fn current_uid(&self) -> Option<Uid> {
        self.identity.current_uid()
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("namespace", &self.namespace)
            .field("stores", &self.registry.len())
            .finish_non_exhaustive()
    }
}
