//! The participant session manager.
//!
//! Owns the active participant record. The record itself lives only in
//! memory; the one thing persisted is the participant's token, encrypted,
//! which is enough to look the record up again after a reload.
//!
//! Recovery is de-duplicated: any number of concurrent callers share one
//! in-flight operation, so a burst of page regions rendering after a reload
//! issues exactly one lookup. The in-flight slot is emptied when that
//! operation settles, whatever the outcome.
//!
//! The slot holds only a weak handle to the shared future. Callers own the
//! future and the future owns the session internals, never the reverse, so
//! a recovery abandoned by every caller is dropped with its last waiter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;
use studydash_core::{Participant, SecretString};
use studydash_secrets::SealedEntry;
use tracing::{debug, warn};

use crate::app_state::{AppState, StatePatch};
use crate::context::StoreContext;
use crate::error::{Result, StateError};
use crate::lookup::ParticipantLookup;

/// Store key of the persisted recovery token.
pub const TOKEN_KEY: &str = "participantState.token";

type RecoveryFuture = Shared<BoxFuture<'static, Option<Participant>>>;

struct InFlight {
    attempt: u64,
    future: WeakShared<BoxFuture<'static, Option<Participant>>>,
}

impl InFlight {
    fn join(&self) -> Option<RecoveryFuture> {
        self.future.upgrade()
    }
}

struct Inner {
    app_state: Arc<AppState>,
    token: SealedEntry,
    lookup: Arc<dyn ParticipantLookup>,
    in_flight: Mutex<Option<InFlight>>,
    next_attempt: AtomicU64,
    // Bumped whenever the participant is set or cleared directly, so a
    // recovery that started earlier does not overwrite the newer choice.
    epoch: AtomicU64,
}

/// Holds the active participant and recovers it after a reload.
#[derive(Clone)]
pub struct ParticipantSession {
    inner: Arc<Inner>,
}

impl ParticipantSession {
    /// Create the manager over the shared volatile state.
    pub fn new(
        ctx: &StoreContext,
        app_state: Arc<AppState>,
        lookup: Arc<dyn ParticipantLookup>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                app_state,
                token: ctx.sealed_entry(TOKEN_KEY),
                lookup,
                in_flight: Mutex::new(None),
                next_attempt: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Make `participant` the active record and persist its token.
    ///
    /// A record without a token, or a call with nobody signed in, still
    /// updates memory; only persistence is skipped.
    pub async fn set_participant(&self, participant: Participant) {
        let epoch = self.inner.bump_epoch();
        let token = participant.token().map(SecretString::new);
        self.inner
            .app_state
            .set_state(StatePatch::new().participant(Some(participant)));

        match self.inner.persist_token(token, epoch).await {
            Ok(()) => debug!("participant token persisted"),
            Err(StateError::MissingToken) => {
                warn!("participant has no token; kept in memory without recovery")
            }
            Err(StateError::Superseded) => debug!("participant changed before token was persisted"),
            Err(e) => warn!("participant kept in memory, token not persisted: {e}"),
        }
    }

    /// The active participant, from memory only.
    pub fn get_participant(&self) -> Option<Participant> {
        self.inner.app_state.participant()
    }

    /// Drop the active participant, its persisted token, and its reports.
    pub fn clear_participant(&self) {
        self.inner.bump_epoch();
        self.inner.clear_memory();
        self.inner.token.remove();
        debug!("participant cleared");
    }

    /// Drop the in-memory participant and reports, keeping the persisted
    /// token for whoever sealed it.
    pub(crate) fn forget_in_memory(&self) {
        self.inner.bump_epoch();
        self.inner.clear_memory();
    }

    /// Decrypt the persisted token. A token sealed for another uid is
    /// reported absent and left in place; a damaged one is also purged.
    pub async fn get_participant_token(&self) -> Option<SecretString> {
        self.inner.token.open().await.map(SecretString::new)
    }

    /// The active participant, recovering it from the persisted token when
    /// memory is empty.
    pub async fn get_participant_from_state(&self) -> Option<Participant> {
        match self.get_participant() {
            Some(participant) => Some(participant),
            None => self.recover_participant_from_session().await,
        }
    }

    /// Rebuild the active participant from the persisted token.
    ///
    /// Concurrent callers share a single in-flight recovery and all receive
    /// its result. Resolves `None` when there is no token, when the lookup
    /// finds no unique match (the token is then removed), or when the lookup
    /// fails (the token is kept for a later retry).
    pub async fn recover_participant_from_session(&self) -> Option<Participant> {
        let future = {
            let mut slot = self.inner.in_flight.lock();
            let joined = slot
                .as_ref()
                .and_then(|in_flight| Some((in_flight.attempt, in_flight.join()?)));
            match joined {
                Some((attempt, future)) => {
                    debug!(attempt, "joining in-flight recovery");
                    future
                }
                None => {
                    let attempt = self.inner.next_attempt.fetch_add(1, Ordering::SeqCst);
                    let future = Arc::clone(&self.inner).recovery(attempt).boxed().shared();
                    *slot = future.downgrade().map(|future| InFlight { attempt, future });
                    future
                }
            }
        };
        future.await
    }

    /// Whether a recovery is currently in flight.
    pub fn recovery_in_flight(&self) -> bool {
        // The upgraded handle may be the last one, so drop it unlocked.
        let joined = self.inner.in_flight.lock().as_ref().and_then(InFlight::join);
        joined.is_some()
    }
}

impl Inner {
    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn clear_memory(&self) {
        self.app_state
            .set_state(StatePatch::new().participant(None).reports(None));
    }

    async fn persist_token(&self, token: Option<SecretString>, epoch: u64) -> Result<()> {
        let token = token.ok_or(StateError::MissingToken)?;
        let uid = self.token.current_uid().ok_or(StateError::MissingIdentity)?;
        let ciphertext = self.token.encrypt_for(token.expose_secret(), &uid).await?;

        if self.epoch.load(Ordering::SeqCst) != epoch
            || self.token.current_uid().as_ref() != Some(&uid)
        {
            return Err(StateError::Superseded);
        }
        self.token.write(&ciphertext);
        Ok(())
    }

    async fn recovery(self: Arc<Self>, attempt: u64) -> Option<Participant> {
        let _settled = SettleGuard {
            inner: Arc::clone(&self),
            attempt,
        };
        self.recover().await
    }

    async fn recover(&self) -> Option<Participant> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let Some(token) = self.token.open().await.map(SecretString::new) else {
            debug!("no recovery token; nothing to recover");
            return None;
        };

        let outcome = self
            .lookup
            .find_by_token(token.expose_secret())
            .await
            .map_err(StateError::from);

        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("participant changed during recovery; discarding lookup result");
            return self.app_state.participant();
        }

        match outcome {
            Ok(response) => match response.into_single_record() {
                Some(participant) => {
                    self.app_state
                        .set_state(StatePatch::new().participant(Some(participant.clone())));
                    debug!("participant recovered from session");
                    Some(participant)
                }
                None => {
                    warn!("recovery lookup found no unique participant; dropping token");
                    self.clear_memory();
                    self.token.remove();
                    None
                }
            },
            Err(e) => {
                warn!("participant recovery failed, token kept for retry: {e}");
                self.clear_memory();
                None
            }
        }
    }
}

/// Empties the in-flight slot when a recovery settles or is dropped.
struct SettleGuard {
    inner: Arc<Inner>,
    attempt: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().map(|f| f.attempt) == Some(self.attempt) {
            *slot = None;
        }
    }
}

impl std::fmt::Debug for ParticipantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantSession")
            .field("token_key", &self.inner.token.storage_key())
            .field("recovery_in_flight", &self.recovery_in_flight())
            .finish()
    }
}
