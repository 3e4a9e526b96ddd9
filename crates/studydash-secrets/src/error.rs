//! Error types for encryption and storage.

use thiserror::Error;

/// Errors that can occur while sealing or opening persisted values.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid ciphertext format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported ciphertext version: {0}")]
    UnsupportedVersion(String),

    #[error("Ciphertext was sealed for another identity")]
    WrongIdentity,

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("No authenticated identity")]
    MissingIdentity,

    #[error("Identity changed while sealing")]
    IdentityChanged,
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
