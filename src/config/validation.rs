//! Config error type, DSN variable expansion and interval parsing.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

use super::app::MIN_MIGRATION_INTERVAL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `${VAR}` without a default and `VAR` is not set.
    #[error("environment variable {0} is not set and has no default")]
    UnsetVariable(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parse a migration interval such as `30s` or `5m`.
///
/// Used as the clap value parser for `watch --interval`, so the same lower
/// bound applies on the command line and in the config file.
///
/// ```
/// use edgetier::config::parse_interval;
///
/// assert_eq!(parse_interval("90s").unwrap().as_secs(), 90);
/// assert!(parse_interval("250ms").is_err());
/// ```
pub fn parse_interval(s: &str) -> Result<Duration, ConfigError> {
    let interval = humantime::parse_duration(s.trim())
        .map_err(|e| ConfigError::Invalid(format!("interval '{s}': {e}")))?;
    check_interval(interval)?;
    Ok(interval)
}

pub(crate) fn check_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval < MIN_MIGRATION_INTERVAL {
        return Err(ConfigError::Invalid(format!(
            "migration interval must be at least {}, got {}",
            humantime::format_duration(MIN_MIGRATION_INTERVAL),
            humantime::format_duration(interval)
        )));
    }
    Ok(())
}

/// Substitute `${VAR}` and `${VAR:-default}` in a DSN.
///
/// An unset variable without a default is an error rather than an empty
/// string, which would silently turn `${DATA_DIR}/edge.db` into `/edge.db`.
pub fn expand_env_vars(dsn: &str) -> Result<String, ConfigError> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("placeholder pattern is valid")
    });

    let mut unset = None;
    let expanded = placeholder.replace_all(dsn, |caps: &Captures| {
        let name = &caps[1];
        match (std::env::var(name), caps.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                unset.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match unset {
        Some(name) => Err(ConfigError::UnsetVariable(name)),
        None => Ok(expanded.into_owned()),
    }
}
