//! Authenticated-identity abstraction.
//!
//! Every persisted value in the state layer is encrypted under a key derived
//! from the uid that is current at write time. The state layer never reaches
//! for an authentication singleton; it is handed an [`IdentityProvider`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the currently authenticated subject.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Create a uid. Surrounding whitespace is trimmed; an empty result is
    /// not a uid.
    pub fn new(uid: impl Into<String>) -> Option<Self> {
        let uid = uid.into();
        let trimmed = uid.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the uid as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Uids end up in key derivation input; keep them out of debug output.
impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Uid(..)")
    }
}

/// Source of the current authenticated subject.
pub trait IdentityProvider: Send + Sync {
    /// The uid of the signed-in subject, or `None` when signed out.
    fn current_uid(&self) -> Option<Uid>;
}

/// A settable identity, updated by whatever observes authentication state.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    uid: RwLock<Option<Uid>>,
}

impl SessionIdentity {
    /// Create a signed-out identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an identity already signed in as `uid`.
    pub fn signed_in(uid: Uid) -> Self {
        Self {
            uid: RwLock::new(Some(uid)),
        }
    }

    /// Replace the current uid.
    pub fn set_uid(&self, uid: Option<Uid>) {
        *self.uid.write() = uid;
    }

    /// Forget the current uid.
    pub fn clear(&self) {
        self.set_uid(None);
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_uid(&self) -> Option<Uid> {
        self.uid.read().clone()
    }
}
