//! Encrypted client-side state and session recovery for StudyDash.
//!
//! This crate provides:
//! - An encrypted store factory: validated state slices mirrored, encrypted,
//!   into per-tab storage under the authenticated uid
//! - Session bootstrap that reloads every store when the uid changes
//! - Concrete stores for role flags, UI flags, and the stats cache
//! - A volatile state container for flags that are never persisted
//! - The participant session manager with de-duplicated recovery
//! - The search result cache, splitting volatile rows from persisted metadata

pub mod app_state;
pub mod bootstrap;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod lookup;
pub mod participant;
pub mod registry;
pub mod schema;
pub mod search;
pub mod store;
pub mod stores;

#[cfg(test)]
mod testing;

pub use app_state::{AppState, StatePatch, VolatileState};
pub use bootstrap::{BindOutcome, SessionBootstrap};
pub use context::StoreContext;
pub use dashboard::DashboardState;
pub use error::{Result, StateError};
pub use lookup::{LookupError, LookupResponse, ParticipantLookup};
pub use participant::ParticipantSession;
pub use registry::{StoreLoader, StoreRegistry};
pub use schema::StoreSchema;
pub use search::{
    sanitize_metadata, LookupSearchMetadata, PageDirection, PredefinedSearchMetadata,
    SearchCache, SearchMetadata,
};
pub use store::EncryptedStore;
pub use stores::{
    RoleFlags, RoleStore, StatsState, StatsStore, UiFlags, UiFlagsStore, WithdrawalFlags,
};
