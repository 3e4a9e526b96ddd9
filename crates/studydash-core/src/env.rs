//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get an environment variable as a u64.
pub fn get_u64(name: &str) -> Option<u64> {
    get_var(name).and_then(|v| v.trim().parse().ok())
}

/// Get an environment variable as a usize.
pub fn get_usize(name: &str) -> Option<usize> {
    get_var(name).and_then(|v| v.trim().parse().ok())
}

/// Environment variable names read by the state layer.
pub mod vars {
    /// Prefix applied to every persisted storage key.
    pub const STUDYDASH_NAMESPACE: &str = "STUDYDASH_NAMESPACE";

    /// Stats cache freshness window, in seconds.
    pub const STUDYDASH_STATS_TTL_SECS: &str = "STUDYDASH_STATS_TTL_SECS";

    /// Upper bound on cached search rows.
    pub const STUDYDASH_MAX_CACHED_RESULTS: &str = "STUDYDASH_MAX_CACHED_RESULTS";

    /// Emit logs as JSON.
    pub const STUDYDASH_LOG_JSON: &str = "STUDYDASH_LOG_JSON";

    /// Hex-encoded 32-byte application key for state encryption.
    pub const STUDYDASH_STATE_KEY: &str = "STUDYDASH_STATE_KEY";
}
