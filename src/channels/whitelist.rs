//! Recipient eligibility gate.

use crate::config::{env_parse, env_var, split_list};
use crate::error::ConfigError;

/// Answers whether an address may receive a notification.
pub trait WhitelistChecker: Send + Sync {
    fn is_allowed(&self, email: &str) -> bool;
}

/// Whitelist policy.
///
/// - `enabled == false` → every address is allowed (open mode)
/// - enabled, list missing or empty → every address is rejected
/// - enabled with entries → case-insensitive (Unicode) exact match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistConfig {
    pub enabled: bool,
    /// `None` when the allow-set could not be loaded.
    pub allowed_recipients: Option<Vec<String>>,
}

impl WhitelistConfig {
    /// Open mode: everyone is eligible.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled with the given allow-set.
    pub fn allow(recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            enabled: true,
            allowed_recipients: Some(recipients.into_iter().map(Into::into).collect()),
        }
    }

    /// Read `NOTIFY_WHITELIST_ENABLED` and `NOTIFY_WHITELIST_RECIPIENTS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_parse("NOTIFY_WHITELIST_ENABLED", false)?,
            allowed_recipients: env_var("NOTIFY_WHITELIST_RECIPIENTS").map(|raw| split_list(&raw)),
        })
    }
}

impl WhitelistChecker for WhitelistConfig {
    fn is_allowed(&self, email: &str) -> bool {
        if !self.enabled {
            return true;
        }
        match &self.allowed_recipients {
            Some(list) if !list.is_empty() => {
                let email = email.trim().to_lowercase();
                list.iter().any(|a| a.trim().to_lowercase() == email)
            }
            _ => false,
        }
    }
}
