//! Dashboard UI flags that should survive a reload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{coerce_bool, coerce_string_list, field, StoreSchema};
use crate::store::EncryptedStore;

/// Withdrawal form hints for the current participant view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalFlags {
    pub has_prior_participation_status: bool,
    pub has_prior_suspended_contact: bool,
}

/// Persisted UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    pub site_dropdown_visible: bool,
    pub withdrawal_flags: WithdrawalFlags,
    /// Ordered column keys of the participant table; `None` means the
    /// table's built-in default columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_columns: Option<Vec<String>>,
    pub filters_expanded: bool,
}

/// Schema of the UI flags store.
pub struct UiFlagsSchema;

impl StoreSchema for UiFlagsSchema {
    type State = UiFlags;
    const KEY: &'static str = "uiState";

    fn defaults() -> UiFlags {
        UiFlags::default()
    }

    fn validate(candidate: &Value) -> UiFlags {
        let withdrawal = field(candidate, "withdrawalFlags").unwrap_or(&Value::Null);
        UiFlags {
            site_dropdown_visible: coerce_bool(field(candidate, "siteDropdownVisible"), false),
            withdrawal_flags: WithdrawalFlags {
                has_prior_participation_status: coerce_bool(
                    field(withdrawal, "hasPriorParticipationStatus"),
                    false,
                ),
                has_prior_suspended_contact: coerce_bool(
                    field(withdrawal, "hasPriorSuspendedContact"),
                    false,
                ),
            },
            active_columns: coerce_string_list(field(candidate, "activeColumns")),
            filters_expanded: coerce_bool(field(candidate, "filtersExpanded"), false),
        }
    }
}

/// UI flags store.
pub type UiFlagsStore = EncryptedStore<UiFlagsSchema>;

impl EncryptedStore<UiFlagsSchema> {
    /// Flip the filter panel and return its new state.
    pub async fn toggle_filters(&self) -> bool {
        self.update(|prev| UiFlags {
            filters_expanded: !prev.filters_expanded,
            ..prev.clone()
        })
        .await
        .filters_expanded
    }

    /// Replace the active column list. `None` restores the default columns.
    pub async fn set_active_columns(&self, columns: Option<Vec<String>>) -> UiFlags {
        self.update(|prev| UiFlags {
            active_columns: columns,
            ..prev.clone()
        })
        .await
    }

    /// Replace the withdrawal hints.
    pub async fn set_withdrawal_flags(&self, flags: WithdrawalFlags) -> UiFlags {
        self.update(|prev| UiFlags {
            withdrawal_flags: flags,
            ..prev.clone()
        })
        .await
    }
}
