//! Adapter configuration and its resolution into validated settings.
//!
//! [`KnowsOptions`] mirrors what an external loader reads from a config file:
//! every numeric field is optional and non-positive values fall back to the
//! defaults below. [`KnowsOptions::resolve`] produces the immutable
//! [`KnowsSettings`] the toolkit is built from.
//!
//! ```rust
//! use std::time::Duration;
//! use knows::{DataScope, KnowsOptions};
//!
//! let settings = KnowsOptions::new("key", "https://api.example.com/")
//!     .with_max_retries(0)
//!     .with_batch_concurrency(0)
//!     .resolve()
//!     .expect("options should resolve");
//!
//! assert_eq!(settings.retry.max_retries, 0);
//! assert_eq!(settings.batch_concurrency, 5);
//! assert_eq!(settings.request_timeout, Duration::from_secs(120));
//! assert_eq!(settings.default_data_scope, DataScope::ALL.to_vec());
//! ```

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

use kclient::{ClientError, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_RETRIES, RetryPolicy, SecretString};
use serde::Deserialize;

use crate::{DataScope, normalize_data_scopes};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    MissingField,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::MissingField, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidValue, message)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}

impl From<ClientError> for ConfigError {
    fn from(error: ClientError) -> Self {
        Self::invalid_value(error.message)
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct KnowsOptions {
    pub api_key: String,
    pub api_base_url: String,
    pub default_data_scope: Vec<String>,
    pub request_timeout_ms: Option<i64>,
    /// Retries beyond the first attempt. Zero disables retrying; negative uses the default.
    pub max_retries: Option<i64>,
    pub retry_backoff_ms: Option<i64>,
    pub batch_concurrency: Option<i64>,
    pub cache_ttl_secs: Option<i64>,
    pub cache_max_entries: Option<i64>,
}

impl Debug for KnowsOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowsOptions")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("default_data_scope", &self.default_data_scope)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("batch_concurrency", &self.batch_concurrency)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_max_entries", &self.cache_max_entries)
            .finish()
    }
}

impl KnowsOptions {
    pub fn new(api_key: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_default_data_scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_data_scope = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(duration_millis(timeout));
        self
    }

    pub fn with_max_retries(mut self, max_retries: i64) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = Some(duration_millis(backoff));
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: i64) -> Self {
        self.batch_concurrency = Some(concurrency);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = Some(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));
        self
    }

    pub fn with_cache_max_entries(mut self, max_entries: i64) -> Self {
        self.cache_max_entries = Some(max_entries);
        self
    }

    pub fn resolve(&self) -> Result<KnowsSettings, ConfigError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::missing_field("knows api_key is required"));
        }

        let api_base_url = self.api_base_url.trim().trim_end_matches('/');
        if api_base_url.is_empty() {
            return Err(ConfigError::missing_field("knows api_base_url is required"));
        }

        let mut default_data_scope = normalize_data_scopes(&self.default_data_scope).map_err(|err| {
            ConfigError::invalid_value(format!("invalid knows default_data_scope: {}", err.message))
        })?;
        if default_data_scope.is_empty() {
            default_data_scope = DataScope::ALL.to_vec();
        }

        let max_retries = match self.max_retries {
            Some(value) if value >= 0 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => DEFAULT_MAX_RETRIES,
        };
        let backoff = positive(self.retry_backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BASE_BACKOFF);

        Ok(KnowsSettings {
            api_key: SecretString::new(api_key),
            api_base_url: api_base_url.to_string(),
            default_data_scope,
            request_timeout: positive(self.request_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            retry: RetryPolicy::new(max_retries, backoff),
            batch_concurrency: positive(self.batch_concurrency)
                .map(|value| usize::try_from(value).unwrap_or(usize::MAX))
                .unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            cache_ttl: positive(self.cache_ttl_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
            cache_max_entries: positive(self.cache_max_entries)
                .map(|value| usize::try_from(value).unwrap_or(usize::MAX))
                .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
        })
    }
}

/// Validated, immutable configuration shared by every operation.
#[derive(Debug, Clone)]
pub struct KnowsSettings {
    pub api_key: SecretString,
    pub api_base_url: String,
    pub default_data_scope: Vec<DataScope>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub batch_concurrency: usize,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
}

fn positive(value: Option<i64>) -> Option<u64> {
    value.filter(|value| *value > 0).and_then(|value| u64::try_from(value).ok())
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
