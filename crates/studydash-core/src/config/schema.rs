//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// State-layer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Ephemeral storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Stats cache settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Search cache settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ephemeral storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Prefix applied to every persisted key (`{namespace}.{storeKey}`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

fn default_namespace() -> String {
    "studydash".to_string()
}

/// Stats cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// How long fetched stats stay fresh, in seconds.
    #[serde(default = "default_stats_ttl")]
    pub ttl_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_stats_ttl(),
        }
    }
}

fn default_stats_ttl() -> u64 {
    900
}

/// Search cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of result rows kept in memory.
    #[serde(default = "default_max_cached_results")]
    pub max_cached_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_cached_results: default_max_cached_results(),
        }
    }
}

fn default_max_cached_results() -> usize {
    500
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `tracing` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
