//! Card configuration parsed from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.adviceslip.com/advice";
pub const DEFAULT_STORAGE_KEY: &str = "cachedAdvice";
pub const DEFAULT_COSMETIC_DELAY_MS: u64 = 1000;
pub const DEFAULT_SAFETY_UNLOCK_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid advice endpoint '{raw}': {reason}")]
    InvalidEndpoint { raw: String, reason: String },
    #[error("safety unlock ({safety_ms}ms) must be longer than the cosmetic delay ({cosmetic_ms}ms)")]
    InvalidTimings { cosmetic_ms: u128, safety_ms: u128 },
}

/// Fixed delays of a click cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Pause between resolving the next advice and showing it.
    pub cosmetic_delay: Duration,
    /// Upper bound on how long one click cycle may hold the lock.
    pub safety_unlock: Duration,
}

impl Timings {
    /// A cycle must be able to finish its cosmetic delay before the safety
    /// timer frees the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if `safety_unlock` is not longer than `cosmetic_delay`.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.safety_unlock <= self.cosmetic_delay {
            return Err(ConfigError::InvalidTimings {
                cosmetic_ms: self.cosmetic_delay.as_millis(),
                safety_ms: self.safety_unlock.as_millis(),
            });
        }
        Ok(self)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cosmetic_delay: Duration::from_millis(DEFAULT_COSMETIC_DELAY_MS),
            safety_unlock: Duration::from_millis(DEFAULT_SAFETY_UNLOCK_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceConfig {
    pub endpoint: Url,
    pub cache_dir: PathBuf,
    pub storage_key: String,
    pub timings: Timings,
    pub http: HttpTimeouts,
}

impl AdviceConfig {
    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `ADVICE_ENDPOINT`: default `https://api.adviceslip.com/advice`
    /// - `ADVICE_CACHE_DIR`: default `$HOME/.cache/advice-card`
    /// - `ADVICE_STORAGE_KEY`: default `cachedAdvice`
    /// - `ADVICE_COSMETIC_DELAY_MS`: default 1000
    /// - `ADVICE_SAFETY_UNLOCK_MS`: default 3000
    /// - `ADVICE_REQUEST_TIMEOUT_SECS`: default 10
    /// - `ADVICE_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// Unparsable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `ADVICE_ENDPOINT` is not an http(s) URL, or if the
    /// safety unlock is not longer than the cosmetic delay.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = match std::env::var("ADVICE_ENDPOINT") {
            Ok(raw) => parse_endpoint(&raw)?,
            Err(_) => parse_endpoint(DEFAULT_ENDPOINT)?,
        };
        let cache_dir = match std::env::var("ADVICE_CACHE_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_cache_dir(),
        };
        let storage_key = match std::env::var("ADVICE_STORAGE_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => DEFAULT_STORAGE_KEY.to_string(),
        };
        let timings = Timings {
            cosmetic_delay: Duration::from_millis(env_parse("ADVICE_COSMETIC_DELAY_MS", DEFAULT_COSMETIC_DELAY_MS)),
            safety_unlock: Duration::from_millis(env_parse("ADVICE_SAFETY_UNLOCK_MS", DEFAULT_SAFETY_UNLOCK_MS)),
        }
        .validate()?;
        let http = HttpTimeouts {
            request_secs: env_parse("ADVICE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("ADVICE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { endpoint, cache_dir, storage_key, timings, http })
    }

    /// Replace the endpoint, validating it the same way `from_env` does.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not an http(s) URL.
    pub fn with_endpoint(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_endpoint(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}

/// Parse and validate an advice endpoint URL.
///
/// # Errors
///
/// Returns an error if `raw` does not parse or uses a scheme other than http(s).
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEndpoint { raw: raw.to_string(), reason: e.to_string() })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            raw: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn default_cache_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".cache").join("advice-card"),
        _ => PathBuf::from(".advice-card"),
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
