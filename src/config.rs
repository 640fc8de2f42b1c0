//! Configuration module for edgetier.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Edge and cloud database settings (DSN, pool size, timeouts)
//! - Partition settings (retention threshold, periodic migration interval)

mod app;
mod validation;

pub use app::{
    AppConfig, DEFAULT_CLOUD_DSN, DEFAULT_EDGE_DSN, DatabaseConfig, MIN_MIGRATION_INTERVAL,
    PartitionConfig,
};
pub use validation::{ConfigError, expand_env_vars, parse_interval};
