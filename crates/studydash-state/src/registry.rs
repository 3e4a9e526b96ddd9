//! Registry of store loaders.
//!
//! Every store registers itself when constructed. Session bootstrap asks the
//! registry to reload all stores for a uid, and sign-out asks it to clear
//! them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use studydash_core::Uid;
use tracing::debug;

/// A store that can be reloaded for a uid and reset to defaults.
#[async_trait]
pub trait StoreLoader: Send + Sync {
    /// Store key, for logging.
    fn name(&self) -> &str;

    /// Decrypt, validate, and seed the store's slice for `uid`. Never fails;
    /// unusable persisted data leaves the store at defaults.
    async fn load(&self, uid: &Uid);

    /// Remove the persisted entry and reset the slice to defaults.
    fn clear(&self);
}

/// Shared list of registered loaders.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    loaders: Arc<RwLock<Vec<Arc<dyn StoreLoader>>>>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader.
    pub fn register(&self, loader: Arc<dyn StoreLoader>) {
        debug!(store = loader.name(), "registering store loader");
        self.loaders.write().push(loader);
    }

    /// Number of registered loaders.
    pub fn len(&self) -> usize {
        self.loaders.read().len()
    }

    /// Whether no loaders are registered.
    pub fn is_empty(&self) -> bool {
        self.loaders.read().is_empty()
    }

    /// Names of registered loaders, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.loaders
            .read()
            .iter()
            .map(|l| l.name().to_string())
            .collect()
    }

    /// Run every loader for `uid` concurrently. Returns the number of loaders
    /// run.
    pub async fn load_all(&self, uid: &Uid) -> usize {
        let loaders = self.snapshot();
        join_all(loaders.iter().map(|loader| loader.load(uid))).await;
        loaders.len()
    }

    /// Clear every registered store.
    pub fn clear_all(&self) {
        for loader in self.snapshot() {
            loader.clear();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn StoreLoader>> {
        self.loaders.read().clone()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.names())
            .finish()
    }
}
