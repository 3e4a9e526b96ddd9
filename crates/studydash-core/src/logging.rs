//! Logging bootstrap.

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this more than once is
/// harmless; the first subscriber stays installed.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = installed {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
}

fn default_directive(config: &LoggingConfig) -> String {
    let level = config.level.as_directive();
    format!("studydash_core={level},studydash_secrets={level},studydash_state={level}")
}
