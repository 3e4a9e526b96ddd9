//! Shared test doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use studydash_core::{Participant, SessionIdentity, Uid};
use studydash_secrets::crypto::generate_app_key;
use studydash_secrets::{AesGcmCryptoProvider, MemoryStorage};
use tokio::sync::Notify;

use crate::context::StoreContext;
use crate::lookup::{LookupError, LookupResponse, ParticipantLookup};

pub struct TestContext {
    pub ctx: StoreContext,
    pub storage: Arc<MemoryStorage>,
    pub identity: Arc<SessionIdentity>,
}

/// A context signed in as `u1`, namespaced `test`.
pub fn context() -> TestContext {
    let storage = Arc::new(MemoryStorage::new());
    let identity = Arc::new(SessionIdentity::signed_in(Uid::new("u1").unwrap()));
    let crypto = Arc::new(AesGcmCryptoProvider::new(generate_app_key().to_vec()).unwrap());
    let ctx = StoreContext::new(crypto, storage.clone(), identity.clone(), "test");
    TestContext {
        ctx,
        storage,
        identity,
    }
}

pub fn participant(token: &str, extra: Value) -> Participant {
    let mut record = Participant::from_value(extra).unwrap_or_default();
    record.insert("token", Value::String(token.to_string()));
    record
}

/// A lookup that counts calls and can hold them until released.
pub struct ScriptedLookup {
    response: Mutex<Result<LookupResponse, LookupError>>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    gated: AtomicBool,
    called: Notify,
    release: Notify,
}

impl ScriptedLookup {
    fn with(response: Result<LookupResponse, LookupError>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            gated: AtomicBool::new(false),
            called: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn found(record: Value) -> Self {
        Self::with(Ok(LookupResponse::ok(vec![record])))
    }

    pub fn not_found() -> Self {
        Self::with(Ok(LookupResponse::ok(Vec::new())))
    }

    pub fn failing(error: LookupError) -> Self {
        Self::with(Err(error))
    }

    /// Hold every call until [`release`](Self::release).
    pub fn gated(self) -> Self {
        self.gated.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_response(&self, response: Result<LookupResponse, LookupError>) {
        *self.response.lock() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ParticipantLookup for ScriptedLookup {
    async fn find_by_token(&self, token: &str) -> Result<LookupResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(token.to_string());
        self.called.notify_one();
        if self.gated.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.response.lock().clone()
    }
}
