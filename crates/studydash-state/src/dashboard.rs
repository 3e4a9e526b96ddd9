//! Top-level wiring of the dashboard state layer.

use std::sync::Arc;
use std::time::Duration;

use studydash_core::{IdentityProvider, StateConfig, Uid};
use studydash_secrets::{CryptoProvider, EphemeralStorage};
use tracing::info;

use crate::app_state::AppState;
use crate::bootstrap::{BindOutcome, SessionBootstrap};
use crate::context::StoreContext;
use crate::error::Result;
use crate::lookup::ParticipantLookup;
use crate::participant::ParticipantSession;
use crate::search::SearchCache;
use crate::store::EncryptedStore;
use crate::stores::{RoleStore, StatsStore, UiFlagsStore};

/// Every store, cache, and manager of one dashboard instance.
pub struct DashboardState {
    ctx: StoreContext,
    bootstrap: SessionBootstrap,
    roles: Arc<RoleStore>,
    ui_flags: Arc<UiFlagsStore>,
    stats: Arc<StatsStore>,
    app_state: Arc<AppState>,
    participant: ParticipantSession,
    search: SearchCache,
    stats_ttl: Duration,
}

impl DashboardState {
    /// Build the state layer. Stores start at defaults until the first
    /// [`handle_identity_change`](Self::handle_identity_change) loads them.
    ///
    /// Fails when `config` does not validate; an empty or malformed
    /// namespace would otherwise leak into every storage key.
    pub fn new(
        config: &StateConfig,
        crypto: Arc<dyn CryptoProvider>,
        storage: Arc<dyn EphemeralStorage>,
        identity: Arc<dyn IdentityProvider>,
        lookup: Arc<dyn ParticipantLookup>,
    ) -> Result<Self> {
        config.validate()?;
        let ctx = StoreContext::new(crypto, storage, identity, config.storage.namespace.clone());
        let app_state = Arc::new(AppState::new());

        let roles = EncryptedStore::new(&ctx);
        let ui_flags = EncryptedStore::new(&ctx);
        let stats = EncryptedStore::new(&ctx);
        let participant = ParticipantSession::new(&ctx, app_state.clone(), lookup);
        let search = SearchCache::new(&ctx, &config.search);
        let bootstrap = SessionBootstrap::new(ctx.registry().clone());

        info!(
            namespace = %config.storage.namespace,
            stores = ctx.registry().len(),
            "dashboard state initialized"
        );

        Ok(Self {
            ctx,
            bootstrap,
            roles,
            ui_flags,
            stats,
            app_state,
            participant,
            search,
            stats_ttl: Duration::from_secs(config.stats.ttl_secs),
        })
    }

    /// React to an identity notification.
    ///
    /// A new uid reloads every store. Switching directly from one uid to
    /// another also drops the previous user's in-memory participant and
    /// result rows; their persisted entries stay sealed for them.
    /// `None` only unbinds; sign-out cleanup is [`sign_out`](Self::sign_out).
    pub async fn handle_identity_change(&self, uid: Option<Uid>) -> Option<BindOutcome> {
        let Some(uid) = uid else {
            self.bootstrap.unbind().await;
            return None;
        };

        let outcome = self.bootstrap.bind(uid).await;
        if let BindOutcome::Reloaded {
            previous: Some(_), ..
        } = &outcome
        {
            self.participant.forget_in_memory();
            self.search.clear_results_cache();
            self.app_state.reset();
            info!("identity switched, previous session state dropped");
        }
        Some(outcome)
    }

    /// Clear everything: every persisted store, the participant and its
    /// token, search rows and metadata, and the volatile flags. The next
    /// login reloads from scratch, even for the same uid.
    pub async fn sign_out(&self) {
        self.ctx.registry().clear_all();
        self.participant.clear_participant();
        self.search.clear_search_results();
        self.app_state.reset();
        self.bootstrap.unbind().await;
        info!("signed out, state cleared");
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    pub fn bootstrap(&self) -> &SessionBootstrap {
        &self.bootstrap
    }

    pub fn roles(&self) -> &Arc<RoleStore> {
        &self.roles
    }

    pub fn ui_flags(&self) -> &Arc<UiFlagsStore> {
        &self.ui_flags
    }

    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    /// Whether cached stats are younger than the configured TTL.
    pub fn stats_fresh(&self) -> bool {
        self.stats.is_fresh(self.stats_ttl)
    }

    pub fn app_state(&self) -> &Arc<AppState> {
        &self.app_state
    }

    pub fn participant(&self) -> &ParticipantSession {
        &self.participant
    }

    pub fn search(&self) -> &SearchCache {
        &self.search
    }
}

impl std::fmt::Debug for DashboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardState")
            .field("context", &self.ctx)
            .field("stats_ttl", &self.stats_ttl)
            .finish_non_exhaustive()
    }
}
