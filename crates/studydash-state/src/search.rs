//! Search result cache.
//!
//! Result rows stay in memory and are never persisted. The metadata needed to
//! re-issue the query is normalized and persisted, encrypted, through a
//! regular store, so a reload keeps the query shape but not the rows.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use studydash_core::config::SearchConfig;
use studydash_core::Participant;
use tracing::{debug, warn};

use crate::context::StoreContext;
use crate::schema::{coerce_string, coerce_u64, field, to_candidate, StoreSchema};
use crate::store::EncryptedStore;

const SEARCH_TYPE: &str = "searchType";
const PREDEFINED_TAG: &str = "predefined";

/// Keys of the predefined metadata shape.
const PREDEFINED_KEYS: &[&str] = &[
    "predefinedType",
    "effectiveType",
    "routeKey",
    "siteCode",
    "startDateFilter",
    "endDateFilter",
    "pageNumber",
    "direction",
    "cursorHistory",
];

/// Describes how to reproduce a cached result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "searchType", rename_all = "lowercase")]
pub enum SearchMetadata {
    /// A participant-list query driven by a navigation route.
    Predefined(PredefinedSearchMetadata),
    /// An ad hoc query by identifying fields.
    Lookup(LookupSearchMetadata),
}

/// Paging direction of the last page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    Next,
    Prev,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedSearchMetadata {
    pub predefined_type: String,
    pub effective_type: String,
    pub route_key: String,
    /// Site filter; a string code or a numeric id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date_filter: Option<String>,
    /// One-based.
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<PageDirection>,
    /// Cursors of the pages visited so far, oldest first.
    pub cursor_history: Vec<String>,
}

/// Free-form lookup fields. Never empty and never holding nulls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupSearchMetadata {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchMetadata {
    /// The predefined shape, if this is a predefined search.
    pub fn as_predefined(&self) -> Option<&PredefinedSearchMetadata> {
        match self {
            SearchMetadata::Predefined(meta) => Some(meta),
            SearchMetadata::Lookup(_) => None,
        }
    }
}

/// Normalize a metadata candidate.
///
/// The candidate is predefined when tagged so or when it carries a
/// predefined type or route key; any other object is a lookup bag. Returns
/// `None` for non-objects and for bags left empty after dropping nulls.
pub fn sanitize_metadata(candidate: &Value) -> Option<SearchMetadata> {
    let map = candidate.as_object()?;
    if is_predefined(map) {
        return Some(SearchMetadata::Predefined(normalize_predefined(candidate)));
    }

    let fields: Map<String, Value> = map
        .iter()
        .filter(|(key, value)| key.as_str() != SEARCH_TYPE && !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if fields.is_empty() {
        return None;
    }
    Some(SearchMetadata::Lookup(LookupSearchMetadata { fields }))
}

fn is_predefined(map: &Map<String, Value>) -> bool {
    let present = |key: &str| map.get(key).is_some_and(|v| !v.is_null());
    map.get(SEARCH_TYPE).and_then(Value::as_str) == Some(PREDEFINED_TAG)
        || present("predefinedType")
        || present("routeKey")
}

fn normalize_predefined(candidate: &Value) -> PredefinedSearchMetadata {
    // A field counts as set when it holds a string, empty or not.
    let text = |key: &str| field(candidate, key).and_then(Value::as_str).map(str::to_string);

    let predefined_type = text("predefinedType");
    let effective_type = text("effectiveType");
    let route_key = text("routeKey")
        .or_else(|| predefined_type.clone())
        .or_else(|| effective_type.clone())
        .unwrap_or_default();
    let effective_type = effective_type
        .or_else(|| predefined_type.clone())
        .unwrap_or_default();

    let site_code = match field(candidate, "siteCode") {
        Some(v @ (Value::String(_) | Value::Number(_))) => Some(v.clone()),
        _ => None,
    };
    let page_number = coerce_u64(field(candidate, "pageNumber"))
        .filter(|n| *n >= 1)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(1);
    let direction = match field(candidate, "direction").and_then(Value::as_str) {
        Some("next") => Some(PageDirection::Next),
        Some("prev") => Some(PageDirection::Prev),
        _ => None,
    };
    let cursor_history = field(candidate, "cursorHistory")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    PredefinedSearchMetadata {
        predefined_type: predefined_type.unwrap_or_default(),
        effective_type,
        route_key,
        site_code,
        start_date_filter: coerce_string(field(candidate, "startDateFilter")),
        end_date_filter: coerce_string(field(candidate, "endDateFilter")),
        page_number,
        direction,
        cursor_history,
    }
}

/// Overlay `overrides` on `base`. A null override removes the key.
fn merge(mut base: Map<String, Value>, overrides: &Value) -> Map<String, Value> {
    if let Some(overrides) = overrides.as_object() {
        for (key, value) in overrides {
            if value.is_null() {
                base.remove(key);
            } else {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    base
}

/// Keep only predefined keys, and tag the result predefined.
fn predefined_only(map: Map<String, Value>) -> Value {
    let mut scoped: Map<String, Value> = map
        .into_iter()
        .filter(|(key, _)| PREDEFINED_KEYS.contains(&key.as_str()))
        .collect();
    scoped.insert(SEARCH_TYPE.to_string(), Value::String(PREDEFINED_TAG.to_string()));
    Value::Object(scoped)
}

/// Persisted search metadata.
pub struct SearchMetadataSchema;

impl StoreSchema for SearchMetadataSchema {
    type State = Option<SearchMetadata>;
    const KEY: &'static str = "searchState.metadata";

    fn defaults() -> Self::State {
        None
    }

    fn validate(candidate: &Value) -> Self::State {
        sanitize_metadata(candidate)
    }
}

/// Volatile result rows plus their persisted metadata.
pub struct SearchCache {
    metadata: Arc<EncryptedStore<SearchMetadataSchema>>,
    results: RwLock<Option<Vec<Participant>>>,
    max_results: usize,
}

impl SearchCache {
    pub fn new(ctx: &StoreContext, config: &SearchConfig) -> Self {
        Self {
            metadata: EncryptedStore::new(ctx),
            results: RwLock::new(None),
            max_results: config.max_cached_results,
        }
    }

    /// Cache `results` and persist the normalized `metadata`.
    pub async fn set_search_results(
        &self,
        metadata: Value,
        mut results: Vec<Participant>,
    ) -> Option<SearchMetadata> {
        if results.len() > self.max_results {
            warn!(
                rows = results.len(),
                max = self.max_results,
                "search results truncated"
            );
            results.truncate(self.max_results);
        }
        *self.results.write() = Some(results);
        self.metadata.set_raw(metadata).await
    }

    pub fn get_search_results(&self) -> Option<Vec<Participant>> {
        self.results.read().clone()
    }

    pub fn get_search_metadata(&self) -> Option<SearchMetadata> {
        self.metadata.get()
    }

    /// The current metadata when it describes a predefined search.
    pub fn get_predefined_metadata(&self) -> Option<PredefinedSearchMetadata> {
        match self.metadata.get() {
            Some(SearchMetadata::Predefined(meta)) => Some(meta),
            _ => None,
        }
    }

    /// Start predefined metadata from `patch` alone, discarding whatever
    /// metadata was cached before.
    pub async fn initialize_predefined_metadata(&self, patch: Value) -> PredefinedSearchMetadata {
        let candidate = predefined_only(merge(Map::new(), &patch));
        self.commit_predefined(candidate).await
    }

    /// Merge `patch` into the cached predefined metadata. Lookup metadata is
    /// never carried over, and non-predefined keys in `patch` are ignored.
    pub async fn update_predefined_metadata(&self, patch: Value) -> PredefinedSearchMetadata {
        let base = match self.get_predefined_metadata() {
            Some(meta) => match to_candidate(&meta) {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        let candidate = predefined_only(merge(base, &patch));
        self.commit_predefined(candidate).await
    }

    async fn commit_predefined(&self, candidate: Value) -> PredefinedSearchMetadata {
        let normalized = normalize_predefined(&candidate);
        self.metadata
            .set(Some(SearchMetadata::Predefined(normalized.clone())))
            .await;
        normalized
    }

    /// Drop the result rows, keeping the metadata so the query can be
    /// re-issued.
    pub fn clear_results_cache(&self) {
        *self.results.write() = None;
        debug!("search results cache cleared");
    }

    /// Drop both rows and metadata.
    pub fn clear_search_results(&self) {
        self.clear_results_cache();
        self.metadata.clear();
    }

    /// Drop rows made stale by an external change.
    pub fn invalidate_search_results_cache(&self) {
        self.clear_results_cache();
    }

    pub fn has_cached_results(&self) -> bool {
        self.results.read().is_some()
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("metadata", &self.metadata.get())
            .field(
                "rows",
                &self.results.read().as_ref().map(|rows| rows.len()),
            )
            .field("max_results", &self.max_results)
            .finish()
    }
}
