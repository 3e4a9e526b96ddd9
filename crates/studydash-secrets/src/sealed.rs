//! A single encrypted slot in ephemeral storage.
//!
//! [`SealedEntry`] binds a namespaced storage key to the crypto provider and
//! the identity provider. Values are encrypted under the uid current at write
//! time. Reading never fails. A value sealed for another uid is reported
//! absent and left in place for its owner; a value that is damaged or in an
//! unknown format is purged and reported absent.

use std::sync::Arc;

use studydash_core::{IdentityProvider, Uid};
use tracing::{debug, warn};

use crate::error::{Result, SecretError};
use crate::provider::CryptoProvider;
use crate::storage::EphemeralStorage;

/// One encrypted storage slot.
#[derive(Clone)]
pub struct SealedEntry {
    storage_key: String,
    crypto: Arc<dyn CryptoProvider>,
    storage: Arc<dyn EphemeralStorage>,
    identity: Arc<dyn IdentityProvider>,
}

impl SealedEntry {
    /// Bind `storage_key` to its collaborators.
    pub fn new(
        storage_key: impl Into<String>,
        crypto: Arc<dyn CryptoProvider>,
        storage: Arc<dyn EphemeralStorage>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            crypto,
            storage,
            identity,
        }
    }

    /// The full storage key of this slot.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// The uid values are currently sealed under.
    pub fn current_uid(&self) -> Option<Uid> {
        self.identity.current_uid()
    }

    /// Encrypt `plaintext` for `uid` without writing it.
    pub async fn encrypt_for(&self, plaintext: &str, uid: &Uid) -> Result<String> {
        self.crypto.encrypt(plaintext, uid.as_str()).await
    }

    /// Write already-encrypted `ciphertext` to the slot.
    pub fn write(&self, ciphertext: &str) {
        self.storage.set_item(&self.storage_key, ciphertext);
    }

    /// Encrypt `plaintext` under the current uid and write it.
    ///
    /// Fails with [`SecretError::MissingIdentity`] when nobody is signed in,
    /// and with [`SecretError::IdentityChanged`] when the uid changed while
    /// encrypting; nothing is written in either case.
    pub async fn seal(&self, plaintext: &str) -> Result<()> {
        let uid = self.current_uid().ok_or(SecretError::MissingIdentity)?;
        let ciphertext = self.encrypt_for(plaintext, &uid).await?;
        if self.current_uid().as_ref() != Some(&uid) {
            return Err(SecretError::IdentityChanged);
        }
        self.write(&ciphertext);
        debug!(key = %self.storage_key, "sealed entry written");
        Ok(())
    }

    /// Decrypt the slot under the current uid.
    ///
    /// With nobody signed in the entry is left alone and reported absent.
    pub async fn open(&self) -> Option<String> {
        let uid = self.current_uid()?;
        self.open_with(&uid).await
    }

    /// Decrypt the slot under `uid`.
    pub async fn open_with(&self, uid: &Uid) -> Option<String> {
        let ciphertext = self.raw()?;
        self.open_ciphertext(&ciphertext, uid).await
    }

    /// The stored ciphertext, as is.
    pub fn raw(&self) -> Option<String> {
        self.storage.get_item(&self.storage_key)
    }

    /// Decrypt `ciphertext` previously read from this slot under `uid`.
    ///
    /// Damaged ciphertext is purged, unless the slot was rewritten in the
    /// meantime. Ciphertext sealed for another uid is left alone.
    pub async fn open_ciphertext(&self, ciphertext: &str, uid: &Uid) -> Option<String> {
        match self.crypto.decrypt(ciphertext, uid.as_str()).await {
            Ok(plaintext) => Some(plaintext),
            Err(SecretError::WrongIdentity) => {
                debug!(key = %self.storage_key, "entry sealed for another identity");
                None
            }
            Err(e) => {
                warn!(key = %self.storage_key, "discarding undecryptable entry: {e}");
                self.remove_if_unchanged(ciphertext);
                None
            }
        }
    }

    /// Remove the slot.
    pub fn remove(&self) {
        self.storage.remove_item(&self.storage_key);
    }

    /// Whether the slot physically holds a value.
    pub fn exists(&self) -> bool {
        self.storage.get_item(&self.storage_key).is_some()
    }

    /// Remove the slot only if it still holds `ciphertext`. A concurrent
    /// write may have replaced it since it was read.
    pub fn remove_if_unchanged(&self, ciphertext: &str) {
        if self.storage.get_item(&self.storage_key).as_deref() == Some(ciphertext) {
            self.remove();
        }
    }
}

impl std::fmt::Debug for SealedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedEntry")
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}
