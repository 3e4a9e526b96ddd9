//! Session bootstrap: reload every store when the signed-in uid changes.
//!
//! Transitions are serialized on the tracked uid, so duplicate identity
//! notifications for one uid reload the stores once.

use studydash_core::Uid;
use tokio::sync::Mutex;
use tracing::info;

use crate::registry::StoreRegistry;

/// Result of [`SessionBootstrap::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// Already bound to this uid; nothing was loaded.
    Unchanged,
    /// Stores were reloaded for the new uid.
    Reloaded {
        previous: Option<Uid>,
        stores: usize,
    },
}

/// Tracks which uid the stores were last loaded for.
#[derive(Debug)]
pub struct SessionBootstrap {
    registry: StoreRegistry,
    tracked: Mutex<Option<Uid>>,
}

impl SessionBootstrap {
    /// Start unbound.
    pub fn new(registry: StoreRegistry) -> Self {
        Self {
            registry,
            tracked: Mutex::new(None),
        }
    }

    /// Bind to `uid`, reloading every registered store unless already bound
    /// to it.
    pub async fn bind(&self, uid: Uid) -> BindOutcome {
        let mut tracked = self.tracked.lock().await;
        if tracked.as_ref() == Some(&uid) {
            return BindOutcome::Unchanged;
        }

        // Loads run with the guard held; a concurrent bind waits for them.
        let stores = self.registry.load_all(&uid).await;
        let previous = tracked.replace(uid);
        info!(
            stores,
            switched = previous.is_some(),
            "session bound, stores reloaded"
        );
        BindOutcome::Reloaded { previous, stores }
    }

    /// Forget the tracked uid so the next bind reloads, even for the same
    /// uid.
    pub async fn unbind(&self) -> Option<Uid> {
        let previous = self.tracked.lock().await.take();
        if previous.is_some() {
            info!("session unbound");
        }
        previous
    }

    /// The uid the stores were last loaded for.
    pub async fn bound_uid(&self) -> Option<Uid> {
        self.tracked.lock().await.clone()
    }
}
