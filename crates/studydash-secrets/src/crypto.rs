//! AES-256-GCM encryption with HKDF-SHA256 key derivation.
//!
//! The cipher key is derived from the application key, a fresh random salt,
//! and the caller's key input (the authenticated uid) as HKDF info. Two uids
//! therefore never share a cipher key, and ciphertext written under one uid
//! fails authentication under any other. Output layout is
//! `salt || nonce || ciphertext_with_tag`.
//!
//! [`key_fingerprint`] derives a short keyed tag per key input. It lets a
//! reader tell "sealed for someone else" apart from "damaged" without ever
//! storing the uid itself.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, SecretError};

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;
pub(crate) const KEY_SIZE: usize = 32;

pub(crate) const FINGERPRINT_SIZE: usize = 8;

/// Domain separation prefix for derived keys.
const HKDF_INFO_PREFIX: &[u8] = b"studydash-state-v1:";

/// Domain separation prefix for key-input fingerprints.
const FINGERPRINT_INFO_PREFIX: &[u8] = b"studydash-fingerprint-v1:";

/// Derive a 256-bit cipher key bound to `key_input`.
fn derive_key(app_key: &[u8], salt: &[u8], key_input: &str) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), app_key);
    let mut info = Vec::with_capacity(HKDF_INFO_PREFIX.len() + key_input.len());
    info.extend_from_slice(HKDF_INFO_PREFIX);
    info.extend_from_slice(key_input.as_bytes());

    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(&info, &mut okm[..])
        .map_err(|e| SecretError::KeyError(e.to_string()))?;
    Ok(okm)
}

/// Keyed fingerprint of `key_input`. Stable for one application key, and
/// reveals nothing about `key_input` without it.
pub fn key_fingerprint(app_key: &[u8], key_input: &str) -> Result<[u8; FINGERPRINT_SIZE]> {
    let hk = Hkdf::<Sha256>::new(None, app_key);
    let mut info = Vec::with_capacity(FINGERPRINT_INFO_PREFIX.len() + key_input.len());
    info.extend_from_slice(FINGERPRINT_INFO_PREFIX);
    info.extend_from_slice(key_input.as_bytes());

    let mut fingerprint = [0u8; FINGERPRINT_SIZE];
    hk.expand(&info, &mut fingerprint)
        .map_err(|e| SecretError::KeyError(e.to_string()))?;
    Ok(fingerprint)
}

/// Encrypt `plaintext` under a key derived from `app_key` and `key_input`.
pub fn seal(app_key: &[u8], key_input: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let key = derive_key(app_key, &salt, key_input)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let mut sealed = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt data previously produced by [`seal`] with the same `key_input`.
pub fn open(app_key: &[u8], key_input: &str, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < SALT_SIZE + NONCE_SIZE {
        return Err(SecretError::InvalidFormat("ciphertext too short".to_string()));
    }

    let (salt, rest) = sealed.split_at(SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

    let key = derive_key(app_key, salt, key_input)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| SecretError::DecryptionFailed(e.to_string()))
}

/// Generate a new random 256-bit application key.
pub fn generate_app_key() -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; KEY_SIZE]);
    rand::thread_rng().fill_bytes(key.as_mut_slice());
    key
}
