//! Configuration types, read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use crate::channels::email::SmtpConfig;
use crate::channels::whitelist::WhitelistConfig;
use crate::error::ConfigError;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default database location.
pub const DEFAULT_DB_PATH: &str = "./data/notifications.db";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Optional JSON file of rules/templates upserted at startup.
    pub seed_path: Option<PathBuf>,
    pub smtp: SmtpConfig,
    pub whitelist: WhitelistConfig,
    pub cors: CorsPolicy,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: env_parse("NOTIFY_PORT", DEFAULT_PORT)?,
            db_path: env_var("NOTIFY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            seed_path: env_var("NOTIFY_SEED_PATH").map(PathBuf::from),
            smtp: SmtpConfig::from_env()?,
            whitelist: WhitelistConfig::from_env()?,
            cors: CorsPolicy::from_env(),
        })
    }
}

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// No cross-origin access.
    #[default]
    Disabled,
    /// Any origin (`*`).
    AnyOrigin,
    /// Exact origin list.
    Origins(Vec<String>),
}

impl CorsPolicy {
    /// Read `NOTIFY_CORS_ORIGINS` (comma-separated, `*` for any).
    pub fn from_env() -> Self {
        Self::parse(&env_var("NOTIFY_CORS_ORIGINS").unwrap_or_default())
    }

    pub fn parse(raw: &str) -> Self {
        let origins = split_list(raw);
        if origins.is_empty() {
            Self::Disabled
        } else if origins.iter().any(|o| o == "*") {
            Self::AnyOrigin
        } else {
            Self::Origins(origins)
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Read a non-blank environment variable.
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default` when unset.
pub(crate) fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

/// Split a comma-separated list, dropping blanks.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
