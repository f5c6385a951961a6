//! Client configuration.
//!
//! # Design
//! Everything that would otherwise be a process-wide constant lives here:
//! the endpoint, API version, timeout, parse strictness, the URL scheme
//! allow-list and the per-operation limits. A `ClientConfig` is immutable
//! once handed to a client.

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{ApiError, Result};
use crate::validate::{Limits, Validator};

pub const DEFAULT_ENDPOINT: &str = "https://api.pinboard.in/";
pub const DEFAULT_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// `result_code` value the service uses for success.
pub const RESULT_DONE: &str = "done";

const ENV_ENDPOINT: &str = "PINBOARD_ENDPOINT";
const ENV_VERSION: &str = "PINBOARD_API_VERSION";
const ENV_TIMEOUT_SECS: &str = "PINBOARD_TIMEOUT_SECS";
const ENV_PARSE_MODE: &str = "PINBOARD_PARSE_MODE";

/// How bulk list and map responses treat malformed entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Fail the whole call on the first malformed entry.
    #[default]
    Strict,
    /// Skip malformed entries and log a warning for each.
    Lenient,
}

impl FromStr for ParseMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ParseMode::Strict),
            "lenient" => Ok(ParseMode::Lenient),
            other => Err(ApiError::Config(format!("unknown parse mode: {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    endpoint: Url,
    version: String,
    timeout: Duration,
    parse_mode: ParseMode,
    validator: Validator,
    limits: Limits,
    result_done: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL"),
            version: DEFAULT_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            parse_mode: ParseMode::default(),
            validator: Validator::default(),
            limits: Limits::default(),
            result_done: RESULT_DONE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `PINBOARD_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config = config.with_endpoint(&endpoint)?;
        }
        if let Ok(version) = std::env::var(ENV_VERSION) {
            config = config.with_version(version);
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .parse()
                .map_err(|_| {
                    ApiError::Config(format!("{ENV_TIMEOUT_SECS} is not a number: {secs:?}"))
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Ok(mode) = std::env::var(ENV_PARSE_MODE) {
            config = config.with_parse_mode(mode.parse()?);
        }
        Ok(config)
    }

    /// Set the service root. A trailing `/` is added if missing so that the
    /// version and operation path segments join beneath it.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let url = Url::parse(&normalized)
            .map_err(|e| ApiError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("endpoint cannot be a base URL: {endpoint:?}")));
        }
        self.endpoint = url;
        Ok(self)
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into().trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn result_done(&self) -> &str {
        &self.result_done
    }

    /// Full URL for `operation` (e.g. `posts/add`), without a query string.
    pub fn operation_url(&self, operation: &str) -> Result<Url> {
        let path = format!("{}/{}", self.version, operation.trim_start_matches('/'));
        self.endpoint
            .join(&path)
            .map_err(|e| ApiError::Config(format!("cannot build URL for {operation}: {e}")))
    }
}
