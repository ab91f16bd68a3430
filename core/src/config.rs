//! Client configuration.
//!
//! Values are fixed once a `PageClient` is built. `from_env` reads the same
//! variables the API's example scripts use, so a shell set up for those
//! works unchanged.

use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_BASE_URL: &str = "NOTION_MARKDOWN_API_URL";
pub const ENV_API_KEY: &str = "NOTION_MARKDOWN_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "NOTION_MARKDOWN_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "NOTION_MARKDOWN_MAX_RETRIES";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for a `PageClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    /// Applied to each attempt separately, not to the whole retry sequence.
    pub timeout: Duration,
    /// Additional attempts after the first on transport failure.
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let mut config = Self::new(base_url, api_key);

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(ENV_MAX_RETRIES) {
            config.max_retries = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_MAX_RETRIES,
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }
}
