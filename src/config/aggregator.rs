//! Aggregator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::schedule::Schedule;

/// Default upper bound on workers per request.
pub const DEFAULT_MAX_WORKERS: usize = 10;
/// Default request deadline in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1_000;
/// Default upper bound on `count` per request.
pub const DEFAULT_MAX_COUNT: usize = 10_000;

/// Environment variable overriding `max_workers`.
pub const ENV_MAX_WORKERS: &str = "CONTENT_MAX_WORKERS";
/// Environment variable overriding `request_timeout_ms`.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CONTENT_REQUEST_TIMEOUT_MS";
/// Environment variable overriding `fetch_timeout_ms`.
pub const ENV_FETCH_TIMEOUT_MS: &str = "CONTENT_FETCH_TIMEOUT_MS";
/// Environment variable overriding `max_count`.
pub const ENV_MAX_COUNT: &str = "CONTENT_MAX_COUNT";

const fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_max_count() -> usize {
    DEFAULT_MAX_COUNT
}

/// Immutable per-process settings handed to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Round-robin source schedule.
    pub schedule: Schedule,
    /// Maximum workers per request.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Request deadline in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Per source call timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,
    /// Largest `count` a single request may ask for.
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl AggregatorConfig {
    /// Configuration with default limits.
    #[must_use]
    pub const fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            max_workers: DEFAULT_MAX_WORKERS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fetch_timeout_ms: None,
            max_count: DEFAULT_MAX_COUNT,
        }
    }

    /// Set the maximum workers per request.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set the largest `count` a request may ask for.
    #[must_use]
    pub const fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    /// Set the request deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the per-call fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-call fetch timeout, if configured.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(invalid("max_workers", "must be greater than 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be greater than 0"));
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(invalid("fetch_timeout_ms", "must be greater than 0 when set"));
        }
        if self.max_count == 0 {
            return Err(invalid("max_count", "must be greater than 0"));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON (including an empty
    /// schedule) and any [`validate`](Self::validate) error.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from the process environment, loading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is not a valid number
    /// or the result fails validation.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `ENV_*` variable names.
    ///
    /// # Errors
    ///
    /// Same as [`with_env_overrides`](Self::with_env_overrides).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_WORKERS) {
            self.max_workers = parse_number(ENV_MAX_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.request_timeout_ms = parse_number(ENV_REQUEST_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FETCH_TIMEOUT_MS) {
            self.fetch_timeout_ms = Some(parse_number(ENV_FETCH_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_COUNT) {
            self.max_count = parse_number(ENV_MAX_COUNT, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(field, &format!("{raw:?}: {e}")))
}

fn duration_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
