//! Participant and report records.
//!
//! Both are opaque to the state layer: the dashboard fetches them from the
//! backend and renders them, the state layer only holds them. A participant is
//! identified by its `token` field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the participant's recovery token.
pub const TOKEN_FIELD: &str = "token";

/// A participant record as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participant(Map<String, Value>);

impl Participant {
    /// Wrap a record's fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a participant from an arbitrary JSON value. Only objects are
    /// participant records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The participant's token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.0
            .get(TOKEN_FIELD)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
    }

    /// Read a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a single field.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// All fields of the record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Reports generated for the current participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reports(Value);

impl Reports {
    /// Wrap report data.
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    /// The raw report data.
    pub fn data(&self) -> &Value {
        &self.0
    }
}
