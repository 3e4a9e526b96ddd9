//! Role flags of the signed-in staff member.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{coerce_bool, field, StoreSchema};
use crate::store::EncryptedStore;

/// Which dashboard roles the signed-in user holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFlags {
    pub is_parent: bool,
    pub coordinating_center: bool,
    pub help_desk: bool,
}

impl RoleFlags {
    /// Coordinating-center and help-desk staff see every site.
    pub fn is_privileged(&self) -> bool {
        self.coordinating_center || self.help_desk
    }
}

/// Schema of the role store.
pub struct RoleSchema;

impl StoreSchema for RoleSchema {
    type State = RoleFlags;
    const KEY: &'static str = "roleState";

    fn defaults() -> RoleFlags {
        RoleFlags::default()
    }

    fn validate(candidate: &Value) -> RoleFlags {
        RoleFlags {
            is_parent: coerce_bool(field(candidate, "isParent"), false),
            coordinating_center: coerce_bool(field(candidate, "coordinatingCenter"), false),
            help_desk: coerce_bool(field(candidate, "helpDesk"), false),
        }
    }
}

/// Role flags store.
pub type RoleStore = EncryptedStore<RoleSchema>;
