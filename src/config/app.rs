//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::db::{
    DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_BUSY_TIMEOUT, DEFAULT_MAX_CONNECTIONS, PoolSettings,
};
use crate::tiering::DEFAULT_RETENTION_ROWS;

use super::validation::{ConfigError, check_interval, expand_env_vars};

// =============================================================================
// Constants
// =============================================================================

/// Default edge database.
pub const DEFAULT_EDGE_DSN: &str = "sqlite:data/edge.db";

/// Default cloud database.
pub const DEFAULT_CLOUD_DSN: &str = "sqlite:data/cloud.db";

/// Minimum interval between periodic migrations (1 second).
pub const MIN_MIGRATION_INTERVAL: Duration = Duration::from_secs(1);

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_ACQUIRE_TIMEOUT
}

fn default_busy_timeout() -> Duration {
    DEFAULT_BUSY_TIMEOUT
}

fn default_retention_rows() -> u64 {
    DEFAULT_RETENTION_ROWS
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Connection settings for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL or bare file path. Supports `${VAR:-default}` expansion.
    pub dsn: String,

    /// Maximum pooled connections (default: 5).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long to wait for a pooled connection (default: 30s).
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// How long a statement waits on a locked database (default: 5s).
    #[serde(default = "default_busy_timeout", with = "humantime_serde")]
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Connection URL with environment variables expanded.
    ///
    /// A bare path such as `data/edge.db` becomes `sqlite:data/edge.db`.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let dsn = expand_env_vars(self.dsn.trim())?;
        if dsn.starts_with("sqlite:") {
            Ok(dsn)
        } else {
            Ok(format!("sqlite:{dsn}"))
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout: self.acquire_timeout,
            busy_timeout: self.busy_timeout,
        }
    }

    fn validate(&self, name: &str) -> Result<String, ConfigError> {
        if self.dsn.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{name} dsn must not be empty")));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(format!(
                "{name} max_connections must be positive"
            )));
        }
        self.connection_url()
    }
}

// =============================================================================
// Partition Configuration
// =============================================================================

/// Edge retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Rows kept in the edge tier after migration (default: 12000).
    #[serde(default = "default_retention_rows")]
    pub retention_rows: u64,

    /// Interval for `watch` mode migrations (e.g. "1m"). Unset disables it.
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            retention_rows: DEFAULT_RETENTION_ROWS,
            interval: None,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Edge tier database.
    pub edge: DatabaseConfig,

    /// Cloud tier database.
    pub cloud: DatabaseConfig,

    /// Retention and migration settings.
    #[serde(default)]
    pub partition: PartitionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            edge: DatabaseConfig::new(DEFAULT_EDGE_DSN),
            cloud: DatabaseConfig::new(DEFAULT_CLOUD_DSN),
            partition: PartitionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if any field is invalid, or
    /// `ConfigError::UnsetVariable` if a DSN references an unset variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let edge_url = self.edge.validate("edge")?;
        let cloud_url = self.cloud.validate("cloud")?;

        if edge_url == cloud_url {
            return Err(ConfigError::Invalid(format!(
                "edge and cloud must use different databases: '{edge_url}'"
            )));
        }

        if let Some(interval) = self.partition.interval {
            check_interval(interval)?;
        }

        Ok(())
    }
}
