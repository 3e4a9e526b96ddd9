//! Application key resolution.
//!
//! The application key is combined with the authenticated uid to derive
//! per-identity cipher keys. It is resolved in priority order:
//! 1. `STUDYDASH_STATE_KEY` environment variable (hex-encoded, 32 bytes)
//! 2. A freshly generated random key
//!
//! A generated key only lives as long as the process. That matches the
//! lifetime of the tab storage it protects, so nothing is lost when it goes.

use studydash_core::env::{self, vars::STUDYDASH_STATE_KEY};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_SIZE};
use crate::error::{Result, SecretError};

/// Resolve the application key.
pub fn resolve_app_key() -> Result<Zeroizing<Vec<u8>>> {
    match env::get_var(STUDYDASH_STATE_KEY) {
        Some(hex_key) => {
            debug!("using state key from environment variable");
            decode_app_key(&hex_key)
        }
        None => {
            debug!("generating process-lifetime state key");
            Ok(crypto::generate_app_key())
        }
    }
}

/// Decode a hex-encoded application key.
pub fn decode_app_key(hex_key: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = Zeroizing::new(hex::decode(hex_key.trim()).map_err(|e| {
        SecretError::KeyError(format!("invalid hex in {STUDYDASH_STATE_KEY}: {e}"))
    })?);
    if key.len() != KEY_SIZE {
        return Err(SecretError::KeyError(format!(
            "{STUDYDASH_STATE_KEY} must decode to exactly {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}
