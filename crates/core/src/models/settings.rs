use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;

pub const ENV_DATABASE: &str = "STOCK_LEDGER_DB";
pub const ENV_FINNHUB_KEY: &str = "FINNHUB_API_KEY";
pub const ENV_QUOTE_TIMEOUT: &str = "STOCK_LEDGER_QUOTE_TIMEOUT_SECS";
pub const ENV_YAHOO_FALLBACK: &str = "STOCK_LEDGER_YAHOO_FALLBACK";

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path of the SQLite ledger database.
    pub database_path: String,

    /// API keys for providers that require them.
    /// Keys: provider name (e.g., "finnhub"). Values: the token.
    pub api_keys: HashMap<String, String>,

    /// Upper bound for a single provider quote request, in seconds.
    pub quote_timeout_secs: u64,

    /// Register Yahoo Finance as a key-less fallback quote source.
    pub yahoo_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "portfolio.db".to_string(),
            api_keys: HashMap::new(),
            quote_timeout_secs: 10,
            yahoo_fallback: true,
        }
    }
}

impl Settings {
    /// Build settings from process environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(path) = get(ENV_DATABASE) {
            settings.database_path = path;
        }

        if let Some(key) = get(ENV_FINNHUB_KEY) {
            settings.api_keys.insert("finnhub".to_string(), key);
        }

        if let Some(raw) = get(ENV_QUOTE_TIMEOUT) {
            let secs: u64 = raw.parse().map_err(|_| {
                CoreError::Config(format!("{ENV_QUOTE_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
            if secs == 0 {
                return Err(CoreError::Config(format!("{ENV_QUOTE_TIMEOUT} must be at least 1")));
            }
            settings.quote_timeout_secs = secs;
        }

        if let Some(raw) = get(ENV_YAHOO_FALLBACK) {
            settings.yahoo_fallback = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(CoreError::Config(format!(
                        "{ENV_YAHOO_FALLBACK} must be true or false, got '{raw}'"
                    )))
                }
            };
        }

        Ok(settings)
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_api_key(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.into(), key.into());
        self
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}
