//! Shared harness for the StudyDash state integration tests.
//!
//! Builds a full [`DashboardState`] over in-memory tab storage, a settable
//! session identity, and a scripted participant lookup.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use studydash_core::{Participant, SessionIdentity, StateConfig, Uid};
use studydash_secrets::crypto::generate_app_key;
use studydash_secrets::{AesGcmCryptoProvider, CryptoProvider, MemoryStorage};
use studydash_state::{DashboardState, LookupError, LookupResponse, ParticipantLookup};
use tokio::sync::Notify;

/// A lookup that counts calls, optionally holding each one until released.
pub struct CountingLookup {
    response: Mutex<Result<LookupResponse, LookupError>>,
    calls: AtomicUsize,
    gated: AtomicBool,
    called: Notify,
    release: Notify,
}

impl CountingLookup {
    pub fn new(response: Result<LookupResponse, LookupError>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            called: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Answers every token with `record`.
    pub fn found(record: Value) -> Self {
        Self::new(Ok(LookupResponse::ok(vec![record])))
    }

    pub fn set_gated(&self, gated: bool) {
        self.gated.store(gated, Ordering::SeqCst);
    }

    pub fn set_response(&self, response: Result<LookupResponse, LookupError>) {
        *self.response.lock() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ParticipantLookup for CountingLookup {
    async fn find_by_token(&self, _token: &str) -> Result<LookupResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_one();
        if self.gated.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.response.lock().clone()
    }
}

/// A dashboard with every collaborator exposed for inspection.
pub struct Harness {
    pub dashboard: DashboardState,
    pub storage: Arc<MemoryStorage>,
    pub identity: Arc<SessionIdentity>,
    pub crypto: Arc<dyn CryptoProvider>,
    pub lookup: Arc<CountingLookup>,
    pub config: StateConfig,
}

impl Harness {
    /// A dashboard with default config, nobody signed in yet.
    pub fn new() -> Self {
        let crypto: Arc<dyn CryptoProvider> =
            Arc::new(AesGcmCryptoProvider::new(generate_app_key().to_vec()).unwrap());
        Self::with_crypto(StateConfig::default(), crypto, Arc::new(MemoryStorage::new()))
    }

    /// A second tab sharing this one's storage and key, as after a reload.
    pub fn reloaded(&self) -> Self {
        let harness = Self::with_crypto(
            self.config.clone(),
            self.crypto.clone(),
            self.storage.clone(),
        );
        harness.identity.set_uid(current(&self.identity));
        harness
    }

    pub fn with_crypto(
        config: StateConfig,
        crypto: Arc<dyn CryptoProvider>,
        storage: Arc<MemoryStorage>,
    ) -> Self {
        let identity = Arc::new(SessionIdentity::new());
        let lookup = Arc::new(CountingLookup::found(json!({"token": "tok-1", "firstName": "Ada"})));
        let dashboard = DashboardState::new(
            &config,
            crypto.clone(),
            storage.clone(),
            identity.clone(),
            lookup.clone(),
        )
        .unwrap();
        Self {
            dashboard,
            storage,
            identity,
            crypto,
            lookup,
            config,
        }
    }

    /// Sign `uid` in and deliver the identity notification.
    pub async fn sign_in(&self, uid: &str) {
        let uid = Uid::new(uid);
        self.identity.set_uid(uid.clone());
        self.dashboard.handle_identity_change(uid).await;
    }

    /// Sign out the way the dashboard does on logout.
    pub async fn sign_out(&self) {
        self.dashboard.sign_out().await;
        self.identity.clear();
        self.dashboard.handle_identity_change(None).await;
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn current(identity: &SessionIdentity) -> Option<Uid> {
    use studydash_core::IdentityProvider;
    identity.current_uid()
}

/// A participant record carrying `token`.
pub fn participant(token: &str) -> Participant {
    Participant::from_value(json!({"token": token, "firstName": "Ada"})).unwrap()
}
