//! Concrete stores built on [`EncryptedStore`](crate::store::EncryptedStore).

mod roles;
mod stats;
mod ui_flags;

pub use roles::{RoleFlags, RoleSchema, RoleStore};
pub use stats::{StatsSchema, StatsState, StatsStore};
pub use ui_flags::{UiFlags, UiFlagsSchema, UiFlagsStore, WithdrawalFlags};
