//! Store schemas and total coercion helpers.
//!
//! A [`StoreSchema`] maps any JSON candidate, however malformed, onto its
//! store's canonical type. Validators built from the helpers below never fail
//! and never panic: a missing field, a wrong type, or a stale field layout all
//! fall back to the field's default.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Canonical shape and validator of one store.
///
/// `validate` must be total and idempotent:
/// `validate(to_value(validate(x))) == validate(x)` for every `x`.
pub trait StoreSchema: Send + Sync + 'static {
    /// The canonical state type.
    type State: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;

    /// Store key, unique per store; the persisted key is namespaced from it.
    const KEY: &'static str;

    /// Default state, seeded before any load completes.
    fn defaults() -> Self::State;

    /// Coerce an arbitrary candidate onto the canonical state.
    fn validate(candidate: &Value) -> Self::State;
}

/// Look up `name` on an object candidate.
pub fn field<'a>(candidate: &'a Value, name: &str) -> Option<&'a Value> {
    candidate.as_object()?.get(name)
}

/// Booleans, plus the strings `"true"` and `"false"`.
pub fn coerce_bool(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Non-blank strings.
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Non-negative integers. Fractions are truncated; numeric strings are parsed.
pub fn coerce_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Arrays of strings. Non-string entries are dropped, duplicates removed with
/// the first occurrence kept.
pub fn coerce_string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(s) = item.as_str() {
            if !out.iter().any(|existing| existing == s) {
                out.push(s.to_string());
            }
        }
    }
    Some(out)
}

/// Objects; anything else becomes an empty map.
pub fn coerce_object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// Serialize a state for re-validation. Canonical state types always
/// serialize; should one ever fail, `null` validates to defaults.
pub fn to_candidate<T: Serialize>(state: &T) -> Value {
    serde_json::to_value(state).unwrap_or(Value::Null)
}
