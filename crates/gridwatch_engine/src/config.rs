use std::time::Duration;

use gridwatch_core::ReconnectPolicy;
use thiserror::Error;
use url::Url;

use crate::batch::BatchSettings;
use crate::fetch::FetchSettings;
use crate::reconnect::ReconnectSettings;

pub const ENV_STREAM_URL: &str = "GRIDWATCH_STREAM_URL";
pub const ENV_MAX_ATTEMPTS: &str = "GRIDWATCH_MAX_ATTEMPTS";
pub const ENV_RETRY_INTERVAL_MS: &str = "GRIDWATCH_RETRY_INTERVAL_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "GRIDWATCH_CONNECT_TIMEOUT_MS";
pub const ENV_GROUP_SIZE: &str = "GRIDWATCH_BATCH_GROUP_SIZE";
pub const ENV_GROUP_PAUSE_MS: &str = "GRIDWATCH_BATCH_PAUSE_MS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "GRIDWATCH_FETCH_TIMEOUT_MS";
pub const ENV_API_URL: &str = "GRIDWATCH_API_URL";
pub const ENV_API_TOKEN: &str = "GRIDWATCH_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} is not a valid url: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },
    #[error("{var} must use one of {expected:?}, got {scheme:?}")]
    UnsupportedScheme {
        var: &'static str,
        scheme: String,
        expected: &'static [&'static str],
    },
}

const STREAM_SCHEMES: &[&str] = &["ws", "wss"];
const API_SCHEMES: &[&str] = &["http", "https"];

/// Deployment constants for the live feed and the weather loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    pub stream_url: String,
    pub max_attempts: u32,
    pub retry_interval: Duration,
    pub connect_timeout: Duration,
    pub group_size: usize,
    pub group_pause: Duration,
    pub fetch_timeout: Duration,
    pub api_base_url: String,
    pub api_token: Option<String>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        let reconnect = ReconnectSettings::default();
        let batch = BatchSettings::default();
        let fetch = FetchSettings::default();
        Self {
            stream_url: reconnect.url,
            max_attempts: reconnect.policy.max_attempts,
            retry_interval: reconnect.policy.interval,
            connect_timeout: reconnect.connect_timeout,
            group_size: batch.group_size,
            group_pause: batch.group_pause,
            fetch_timeout: batch.fetch_timeout,
            api_base_url: fetch.api_base_url,
            api_token: fetch.bearer_token,
        }
    }
}

impl LiveConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset or
    /// blank variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let stream_url = match get(ENV_STREAM_URL) {
            Some(value) => checked_url(ENV_STREAM_URL, value, STREAM_SCHEMES)?,
            None => defaults.stream_url,
        };
        let api_base_url = match get(ENV_API_URL) {
            Some(value) => checked_url(ENV_API_URL, value, API_SCHEMES)?,
            None => defaults.api_base_url,
        };

        Ok(Self {
            stream_url,
            max_attempts: number(ENV_MAX_ATTEMPTS, get(ENV_MAX_ATTEMPTS))?
                .unwrap_or(defaults.max_attempts),
            retry_interval: millis(ENV_RETRY_INTERVAL_MS, get(ENV_RETRY_INTERVAL_MS))?
                .unwrap_or(defaults.retry_interval),
            connect_timeout: millis(ENV_CONNECT_TIMEOUT_MS, get(ENV_CONNECT_TIMEOUT_MS))?
                .unwrap_or(defaults.connect_timeout),
            group_size: number(ENV_GROUP_SIZE, get(ENV_GROUP_SIZE))?
                .unwrap_or(defaults.group_size),
            group_pause: millis(ENV_GROUP_PAUSE_MS, get(ENV_GROUP_PAUSE_MS))?
                .unwrap_or(defaults.group_pause),
            fetch_timeout: millis(ENV_FETCH_TIMEOUT_MS, get(ENV_FETCH_TIMEOUT_MS))?
                .unwrap_or(defaults.fetch_timeout),
            api_base_url,
            api_token: get(ENV_API_TOKEN),
        })
    }

    pub fn reconnect_settings(&self) -> ReconnectSettings {
        ReconnectSettings {
            url: self.stream_url.clone(),
            policy: ReconnectPolicy::new(self.max_attempts, self.retry_interval),
            connect_timeout: self.connect_timeout,
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            group_size: self.group_size,
            group_pause: self.group_pause,
            fetch_timeout: self.fetch_timeout,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            api_base_url: self.api_base_url.clone(),
            bearer_token: self.api_token.clone(),
            ..FetchSettings::default()
        }
    }
}

fn checked_url(
    var: &'static str,
    value: String,
    expected: &'static [&'static str],
) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    let url = Url::parse(&value).map_err(|source| ConfigError::InvalidUrl { var, source })?;
    if !expected.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            var,
            scheme: url.scheme().to_string(),
            expected,
        });
    }
    Ok(value)
}

fn number<N: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
) -> Result<Option<N>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse::<N>()
                .map_err(|_| ConfigError::InvalidNumber { var, value })
        })
        .transpose()
}

fn millis(var: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    Ok(number::<u64>(var, value)?.map(Duration::from_millis))
}
