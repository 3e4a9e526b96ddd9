//! The crypto provider contract and its AES-GCM implementation.
//!
//! Providers work on strings end to end: the state layer hands over JSON
//! text and stores whatever string comes back in ephemeral storage.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::crypto;
use crate::error::{Result, SecretError};

/// Prefix identifying the current ciphertext format.
const FORMAT_V1: &str = "v1";

/// Encrypts and decrypts persisted state.
///
/// Implementations must guarantee that the same `key_input` decrypts what it
/// encrypted (across reloads) and that a different `key_input` fails with
/// [`SecretError::WrongIdentity`] rather than a decryption error.
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Encrypt `plaintext` under a key derived from `key_input`.
    async fn encrypt(&self, plaintext: &str, key_input: &str) -> Result<String>;

    /// Decrypt `ciphertext` under a key derived from `key_input`.
    async fn decrypt(&self, ciphertext: &str, key_input: &str) -> Result<String>;
}

/// AES-256-GCM provider with HKDF-SHA256 key derivation.
///
/// Ciphertext strings look like `v1.<fingerprint>.<base64>`, where the
/// fingerprint is a keyed hex tag of the key input. A fingerprint mismatch
/// is reported as [`SecretError::WrongIdentity`]; a match that then fails
/// authentication is [`SecretError::DecryptionFailed`].
pub struct AesGcmCryptoProvider {
    app_key: Zeroizing<Vec<u8>>,
}

impl AesGcmCryptoProvider {
    /// Create a provider from a 32-byte application key.
    pub fn new(app_key: Vec<u8>) -> Result<Self> {
        if app_key.len() != crypto::KEY_SIZE {
            return Err(SecretError::KeyError(format!(
                "application key must be exactly {} bytes, got {}",
                crypto::KEY_SIZE,
                app_key.len()
            )));
        }
        Ok(Self {
            app_key: Zeroizing::new(app_key),
        })
    }

    /// Create a provider using the key resolved by
    /// [`crate::keychain::resolve_app_key`].
    pub fn from_env() -> Result<Self> {
        let key = crate::keychain::resolve_app_key()?;
        Self::new(key.to_vec())
    }
}

impl std::fmt::Debug for AesGcmCryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCryptoProvider")
            .field("app_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CryptoProvider for AesGcmCryptoProvider {
    async fn encrypt(&self, plaintext: &str, key_input: &str) -> Result<String> {
        let fingerprint = crypto::key_fingerprint(&self.app_key, key_input)?;
        let sealed = crypto::seal(&self.app_key, key_input, plaintext.as_bytes())?;
        Ok(format!(
            "{FORMAT_V1}.{}.{}",
            hex::encode(fingerprint),
            STANDARD.encode(sealed)
        ))
    }

    async fn decrypt(&self, ciphertext: &str, key_input: &str) -> Result<String> {
        let (version, body) = ciphertext
            .split_once('.')
            .ok_or_else(|| SecretError::InvalidFormat("missing version prefix".to_string()))?;
        if version != FORMAT_V1 {
            return Err(SecretError::UnsupportedVersion(version.to_string()));
        }

        let (fingerprint, payload) = body
            .split_once('.')
            .ok_or_else(|| SecretError::InvalidFormat("missing key fingerprint".to_string()))?;
        let expected = crypto::key_fingerprint(&self.app_key, key_input)?;
        if fingerprint != hex::encode(expected) {
            return Err(SecretError::WrongIdentity);
        }

        let sealed = STANDARD
            .decode(payload)
            .map_err(|e| SecretError::InvalidFormat(format!("base64 decode failed: {e}")))?;
        let plaintext = crypto::open(&self.app_key, key_input, &sealed)?;
        String::from_utf8(plaintext)
            .map_err(|e| SecretError::DecryptionFailed(format!("invalid UTF-8: {e}")))
    }
}
