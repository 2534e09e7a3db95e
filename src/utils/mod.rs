//! Configuration utilities.

/// TOML configuration (`ragdesk.toml`) with environment overrides.
pub mod toml_config;

pub use toml_config::{ConfigError, RagdeskConfig};
