//! Cached dashboard statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{coerce_object, coerce_u64, field, StoreSchema};
use crate::store::EncryptedStore;

/// Last fetched stats and when they were fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsState {
    pub stats_data: Map<String, Value>,
    /// Epoch milliseconds of the fetch; `0` when nothing was fetched.
    pub stats_data_update_time: u64,
}

impl StatsState {
    /// Whether the cached stats were fetched within `ttl` of `now_ms`.
    pub fn is_fresh(&self, now_ms: u64, ttl: Duration) -> bool {
        if self.stats_data_update_time == 0 {
            return false;
        }
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        now_ms.saturating_sub(self.stats_data_update_time) < ttl_ms
    }
}

/// Schema of the stats store.
pub struct StatsSchema;

impl StoreSchema for StatsSchema {
    type State = StatsState;
    const KEY: &'static str = "statsState";

    fn defaults() -> StatsState {
        StatsState::default()
    }

    fn validate(candidate: &Value) -> StatsState {
        StatsState {
            stats_data: coerce_object(field(candidate, "statsData")),
            stats_data_update_time: coerce_u64(field(candidate, "statsDataUpdateTime"))
                .unwrap_or(0),
        }
    }
}

/// Stats cache store.
pub type StatsStore = EncryptedStore<StatsSchema>;

impl EncryptedStore<StatsSchema> {
    /// Cache freshly fetched stats, stamped with the current time.
    pub async fn record(&self, stats_data: Map<String, Value>) -> StatsState {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        self.set(StatsState {
            stats_data,
            stats_data_update_time: now,
        })
        .await
    }

    /// Whether the cached stats are younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        self.get().is_fresh(now, ttl)
    }
}
