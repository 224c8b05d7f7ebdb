use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::services::prompts::DEFAULT_LANGUAGE;

pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional key to pre-seed the session credential store
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Completion length cap; `None` leaves it to the provider
    pub max_tokens: Option<u32>,
    pub bind_addr: String,
    pub default_language: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup (env, map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw))?;
                if secs == 0 {
                    anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(60),
        };

        let max_tokens = match non_empty("OPENROUTER_MAX_TOKENS") {
            Some(raw) => {
                let tokens: u32 = raw
                    .parse()
                    .with_context(|| format!("OPENROUTER_MAX_TOKENS must be a positive whole number, got '{}'", raw))?;
                if tokens == 0 {
                    anyhow::bail!("OPENROUTER_MAX_TOKENS must be greater than zero");
                }
                Some(tokens)
            }
            None => None,
        };

        Ok(Self {
            api_key: non_empty("OPENROUTER_API_KEY"),
            model: non_empty("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("OPENROUTER_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout,
            max_tokens,
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            default_language: non_empty("DEFAULT_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        })
    }
}
