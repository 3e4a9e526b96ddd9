//! Configuration loading and persistence.

use super::{LogLevel, StateConfig};
use crate::env;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Maximum accepted namespace length.
const MAX_NAMESPACE_LEN: usize = 64;

impl StateConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Load from `path` if given and present, otherwise start from defaults.
    /// Environment overrides are applied in both cases.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config = match path.map(Self::load) {
            Some(Ok(config)) => config,
            Some(Err(ConfigError::NotFound(_))) | None => Self::default(),
            Some(Err(e)) => {
                tracing::warn!("ignoring unreadable state config: {e}");
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    /// Apply `STUDYDASH_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(namespace) = env::get_var(env::vars::STUDYDASH_NAMESPACE) {
            self.storage.namespace = namespace;
        }
        if let Some(ttl) = env::get_u64(env::vars::STUDYDASH_STATS_TTL_SECS) {
            self.stats.ttl_secs = ttl;
        }
        if let Some(max) = env::get_usize(env::vars::STUDYDASH_MAX_CACHED_RESULTS) {
            self.search.max_cached_results = max;
        }
        if env::get_bool(env::vars::STUDYDASH_LOG_JSON) {
            self.logging.json = true;
        }
        self
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let namespace = &self.storage.namespace;
        if namespace.is_empty() {
            errors.push("Storage namespace must not be empty".to_string());
        } else if namespace.len() > MAX_NAMESPACE_LEN {
            errors.push(format!(
                "Storage namespace exceeds maximum length of {MAX_NAMESPACE_LEN} characters"
            ));
        } else if !namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            errors.push(format!(
                "Storage namespace '{}' contains invalid characters (allowed: alphanumeric, underscore, hyphen)",
                namespace
            ));
        }

        if self.search.max_cached_results == 0 {
            errors.push("Search max_cached_results must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct StateConfigBuilder {
    config: StateConfig,
}

impl StateConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.storage.namespace = namespace.into();
        self
    }

    /// Set the stats freshness window.
    pub fn stats_ttl_secs(mut self, secs: u64) -> Self {
        self.config.stats.ttl_secs = secs;
        self
    }

    /// Set the maximum number of cached search rows.
    pub fn max_cached_results(mut self, max: usize) -> Self {
        self.config.search.max_cached_results = max;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Emit JSON logs.
    pub fn json_logs(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Build the config.
    pub fn build(self) -> StateConfig {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<StateConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
