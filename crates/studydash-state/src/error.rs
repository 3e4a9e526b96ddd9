//! Error types for the state layer.
//!
//! Only [`StateError::Config`] crosses the public boundary, when a dashboard
//! is built from an invalid config. The rest are raised inside the stores and
//! the session manager and turned into a logged warning plus a safe fallback
//! at the layer that catches them.

use thiserror::Error;

use crate::lookup::LookupError;

/// Errors raised inside the state layer.
#[derive(Debug, Error)]
pub enum StateError {
    /// Persistence attempted with nobody signed in.
    #[error("No authenticated identity; persistence skipped")]
    MissingIdentity,

    /// A participant record without a token cannot be recovered later.
    #[error("Participant has no token; persistence skipped")]
    MissingToken,

    /// A newer write or a uid change overtook this one.
    #[error("Write superseded before it was persisted")]
    Superseded,

    /// Encryption or decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] studydash_secrets::SecretError),

    /// Decrypted plaintext was not a readable state envelope.
    #[error("Corrupt persisted state: {0}")]
    Corrupt(String),

    /// State could not be encoded for persistence.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The dashboard config failed validation.
    #[error("Config error: {0}")]
    Config(#[from] studydash_core::ConfigError),

    /// The participant lookup failed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

/// Convenience result alias for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
