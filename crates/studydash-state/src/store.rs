//! The encrypted store factory.
//!
//! An [`EncryptedStore`] is one named, validated state slice. The in-memory
//! slice is authoritative and always readable; a copy is encrypted under the
//! current uid and mirrored into tab storage so a reload can restore it.
//!
//! Every value that reaches the slice has passed through the schema's
//! validator, whether it came from a caller or from storage.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use studydash_core::Uid;
use studydash_secrets::SealedEntry;
use tracing::{debug, warn};

use crate::context::StoreContext;
use crate::error::{Result, StateError};
use crate::registry::StoreLoader;
use crate::schema::{to_candidate, StoreSchema};

/// Version of the plaintext envelope persisted stores write.
const ENVELOPE_VERSION: u32 = 1;

/// Plaintext layout of a persisted store.
#[derive(Serialize)]
struct EnvelopeOut<'a, T: Serialize> {
    v: u32,
    state: &'a T,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    v: u32,
    state: Value,
}

/// A validated, encrypted, namespaced state slice.
pub struct EncryptedStore<S: StoreSchema> {
    entry: SealedEntry,
    state: RwLock<S::State>,
    // Bumped under the state write lock by every set and clear.
    generation: AtomicU64,
    _schema: PhantomData<S>,
}

impl<S: StoreSchema> EncryptedStore<S> {
    /// Create the store, seed defaults, and register its loader with the
    /// context's registry.
    pub fn new(ctx: &StoreContext) -> Arc<Self> {
        let store = Arc::new(Self {
            entry: ctx.sealed_entry(S::KEY),
            state: RwLock::new(validated_defaults::<S>()),
            generation: AtomicU64::new(0),
            _schema: PhantomData,
        });
        ctx.registry().register(store.clone());
        store
    }

    /// Store key.
    pub fn key(&self) -> &'static str {
        S::KEY
    }

    /// Namespaced key of the persisted entry.
    pub fn storage_key(&self) -> &str {
        self.entry.storage_key()
    }

    /// Snapshot of the current state. Callers get their own copy.
    pub fn get(&self) -> S::State {
        self.state.read().clone()
    }

    /// Replace the state with `value`, validated.
    pub async fn set(&self, value: S::State) -> S::State {
        self.commit(to_candidate(&value)).await
    }

    /// Replace the state with an untyped candidate, validated.
    pub async fn set_raw(&self, candidate: Value) -> S::State {
        self.commit(candidate).await
    }

    /// Derive the next state from the current one, validated.
    pub async fn update<F>(&self, f: F) -> S::State
    where
        F: FnOnce(&S::State) -> S::State,
    {
        let next = f(&self.get());
        self.set(next).await
    }

    /// Remove the persisted entry and reset the slice to defaults.
    pub fn clear(&self) {
        {
            let mut state = self.state.write();
            *state = validated_defaults::<S>();
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.entry.remove();
        debug!(store = S::KEY, "store cleared");
    }

    async fn commit(&self, candidate: Value) -> S::State {
        let next = S::validate(&candidate);
        let generation = {
            let mut state = self.state.write();
            *state = next.clone();
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        match self.persist(&next, generation).await {
            Ok(()) => debug!(store = S::KEY, "state persisted"),
            Err(StateError::MissingIdentity) => {
                warn!(store = S::KEY, "no authenticated identity; state kept in memory only")
            }
            Err(StateError::Superseded) => {
                debug!(store = S::KEY, "persistence superseded by a newer write")
            }
            Err(e) => warn!(store = S::KEY, "failed to persist state: {e}"),
        }
        next
    }

    async fn persist(&self, state: &S::State, generation: u64) -> Result<()> {
        let uid = self.entry.current_uid().ok_or(StateError::MissingIdentity)?;
        let plaintext = serde_json::to_string(&EnvelopeOut {
            v: ENVELOPE_VERSION,
            state,
        })?;
        let ciphertext = self.entry.encrypt_for(&plaintext, &uid).await?;

        // Only the latest committed state may land, and only for the uid it
        // was encrypted under.
        let _state = self.state.read();
        if self.generation.load(Ordering::SeqCst) != generation
            || self.entry.current_uid().as_ref() != Some(&uid)
        {
            return Err(StateError::Superseded);
        }
        self.entry.write(&ciphertext);
        Ok(())
    }

    async fn read_persisted(&self, ciphertext: &str, uid: &Uid) -> Result<Option<S::State>> {
        let Some(plaintext) = self.entry.open_ciphertext(ciphertext, uid).await else {
            return Ok(None);
        };
        let candidate = parse_envelope(&plaintext)?;
        Ok(Some(S::validate(&candidate)))
    }
}

/// Extract the state candidate from decrypted plaintext. Bare JSON without an
/// envelope, or an envelope of another version, is handed to the validator
/// as-is.
fn parse_envelope(plaintext: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(plaintext).map_err(|e| StateError::Corrupt(e.to_string()))?;
    match serde_json::from_value::<EnvelopeIn>(value.clone()) {
        Ok(envelope) if envelope.v == ENVELOPE_VERSION => Ok(envelope.state),
        Ok(envelope) => {
            debug!(version = envelope.v, "loading state from another envelope version");
            Ok(envelope.state)
        }
        Err(_) => Ok(value),
    }
}

fn validated_defaults<S: StoreSchema>() -> S::State {
    S::validate(&to_candidate(&S::defaults()))
}

#[async_trait]
impl<S: StoreSchema> StoreLoader for EncryptedStore<S> {
    fn name(&self) -> &str {
        S::KEY
    }

    async fn load(&self, uid: &Uid) {
        let generation = self.generation.load(Ordering::SeqCst);
        let loaded = match self.entry.raw() {
            None => validated_defaults::<S>(),
            Some(ciphertext) => match self.read_persisted(&ciphertext, uid).await {
                Ok(Some(state)) => state,
                Ok(None) => validated_defaults::<S>(),
                Err(e) => {
                    warn!(store = S::KEY, "discarding unreadable persisted state: {e}");
                    self.entry.remove_if_unchanged(&ciphertext);
                    validated_defaults::<S>()
                }
            },
        };

        // A set or clear that ran while decrypting wins over the loaded value.
        let mut state = self.state.write();
        if self.generation.load(Ordering::SeqCst) == generation {
            *state = loaded;
            debug!(store = S::KEY, "store loaded");
        }
    }

    fn clear(&self) {
        EncryptedStore::clear(self);
    }
}

impl<S: StoreSchema> std::fmt::Debug for EncryptedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore")
            .field("key", &S::KEY)
            .field("state", &*self.state.read())
            .finish()
    }
}
