//! # studydash-core
//!
//! Core types, configuration, and contracts shared by the StudyDash
//! client-side state layer.
//!
//! - **Configuration**: Loading, validation, and persistence of the state config
//! - **Identity**: The authenticated-subject abstraction every persisted value is keyed to
//! - **Types**: Participant and report records owned by the session layer
//! - **Utilities**: Environment handling, logging bootstrap, secret strings

pub mod config;
pub mod env;
pub mod error;
pub mod identity;
pub mod logging;
pub mod secret;
pub mod types;

// Re-exports for convenience
pub use config::StateConfig;
pub use error::{ConfigError, Error, Result};
pub use identity::{IdentityProvider, SessionIdentity, Uid};
pub use secret::SecretString;
pub use types::*;
