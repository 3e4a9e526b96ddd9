//! Encryption and ephemeral storage for the StudyDash state layer.
//!
//! Provides the crypto provider contract with an AES-256-GCM implementation
//! keyed per authenticated uid, the per-tab storage contract, and
//! [`SealedEntry`], a single encrypted storage slot.

pub mod crypto;
pub mod error;
pub mod keychain;
pub mod provider;
pub mod sealed;
pub mod storage;

pub use error::{Result, SecretError};
pub use provider::{AesGcmCryptoProvider, CryptoProvider};
pub use sealed::SealedEntry;
pub use storage::{EphemeralStorage, MemoryStorage};
