//! The external "find participant by token" lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use studydash_core::Participant;
use thiserror::Error;

/// Status code of a successful lookup.
pub const STATUS_OK: u16 = 200;

/// Failures reaching the lookup backend. A response that arrived, whatever
/// it says, is not an error.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Raw lookup response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub status_code: u16,
    #[serde(default)]
    pub records: Vec<Value>,
}

impl LookupResponse {
    /// A successful response carrying `records`.
    pub fn ok(records: Vec<Value>) -> Self {
        Self {
            status_code: STATUS_OK,
            records,
        }
    }

    /// The matched participant: status 200 and exactly one object record.
    /// Anything else is not-found.
    pub fn into_single_record(self) -> Option<Participant> {
        if self.status_code != STATUS_OK || self.records.len() != 1 {
            return None;
        }
        self.records.into_iter().next().and_then(Participant::from_value)
    }
}

/// Backend lookup of a participant by token.
#[async_trait]
pub trait ParticipantLookup: Send + Sync {
    /// Find participants whose token equals `token`.
    async fn find_by_token(&self, token: &str) -> Result<LookupResponse, LookupError>;
}
