//! Process configuration read from the environment.

use anyhow::Context;
use chrono::Duration;
use tracing::warn;

use crate::clients::options::DEFAULT_OPTIONS_TTL_SECS;

pub const ENV_OPTIONS_CACHE_TTL_SECS: &str = "PARCEL_OPTIONS_CACHE_TTL_SECS";
pub const ENV_TRACKING_CODE_ATTEMPTS: &str = "PARCEL_TRACKING_CODE_ATTEMPTS";
pub const ENV_DEFAULT_PAGE_LIMIT: &str = "PARCEL_DEFAULT_PAGE_LIMIT";
pub const ENV_SUMMARY_TRACKING_LIMIT: &str = "PARCEL_SUMMARY_TRACKING_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub options_cache_ttl: Duration,
    pub tracking_code_attempts: u32,
    pub default_page_limit: usize,
    pub summary_tracking_limit: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            options_cache_ttl: Duration::seconds(DEFAULT_OPTIONS_TTL_SECS),
            tracking_code_attempts: 5,
            default_page_limit: 50,
            summary_tracking_limit: 20,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ttl) = parse::<i64>(&lookup, ENV_OPTIONS_CACHE_TTL_SECS)? {
            if ttl > 0 {
                config.options_cache_ttl = Duration::seconds(ttl);
            } else {
                warn!(ttl, "non-positive options cache ttl, using default");
            }
        }
        if let Some(attempts) = parse::<u32>(&lookup, ENV_TRACKING_CODE_ATTEMPTS)? {
            config.tracking_code_attempts = attempts.max(1);
        }
        if let Some(limit) = parse::<usize>(&lookup, ENV_DEFAULT_PAGE_LIMIT)? {
            if limit > 0 {
                config.default_page_limit = limit;
            }
        }
        if let Some(limit) = parse::<usize>(&lookup, ENV_SUMMARY_TRACKING_LIMIT)? {
            config.summary_tracking_limit = limit;
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid {key}: '{raw}'")),
        None => Ok(None),
    }
}
