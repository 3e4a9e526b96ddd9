//! Ephemeral per-tab storage.
//!
//! The storage surface is synchronous string get/set/remove, cleared when the
//! tab goes away. Only ciphertext is ever written to it.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Synchronous string key/value storage scoped to one tab.
pub trait EphemeralStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str);

    /// Remove the value stored under `key`, if any.
    fn remove_item(&self, key: &str);

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<String>;
}

/// In-process tab storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop everything, as closing the tab would.
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl EphemeralStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}
