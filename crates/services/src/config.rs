use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::http::RetryPolicy;

pub const DEFAULT_LMS_BASE_URL: &str = "http://localhost:18000";
pub const DEFAULT_CSRF_TOKEN_API_PATH: &str = "/csrf/api/v1/token";
pub const DEFAULT_REFRESH_ENDPOINT: &str = "/login_refresh";
pub const DEFAULT_JWT_COOKIE_NAME: &str = "edx-jwt-cookie-header-payload";
pub const DEFAULT_CSRF_COOKIE_NAME: &str = "csrftoken";

/// Where the LMS lives and how the client talks to it.
#[derive(Clone, Debug)]
pub struct SupportConfig {
    pub base_url: Url,
    pub csrf_token_api_path: String,
    pub refresh_endpoint: String,
    pub jwt_cookie_name: String,
    pub csrf_cookie_name: String,
    pub retry: RetryPolicy,
}

impl SupportConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            csrf_token_api_path: DEFAULT_CSRF_TOKEN_API_PATH.into(),
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.into(),
            jwt_cookie_name: DEFAULT_JWT_COOKIE_NAME.into(),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE_NAME.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Read `LEARNER_SUPPORT_*` variables, falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SupportConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a set variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let base_url = read("LEARNER_SUPPORT_LMS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_LMS_BASE_URL.to_string());
        let mut config = Self::new(parse_base_url(&base_url)?);

        if let Some(path) = read("LEARNER_SUPPORT_CSRF_TOKEN_API_PATH") {
            config.csrf_token_api_path = path;
        }
        if let Some(path) = read("LEARNER_SUPPORT_REFRESH_ENDPOINT") {
            config.refresh_endpoint = path;
        }
        if let Some(name) = read("LEARNER_SUPPORT_JWT_COOKIE_NAME") {
            config.jwt_cookie_name = name;
        }
        if let Some(name) = read("LEARNER_SUPPORT_CSRF_COOKIE_NAME") {
            config.csrf_cookie_name = name;
        }
        if let Some(raw) = read("LEARNER_SUPPORT_MAX_RETRIES") {
            config.retry.max_retries = parse_number("LEARNER_SUPPORT_MAX_RETRIES", &raw)?;
        }
        if let Some(raw) = read("LEARNER_SUPPORT_MAX_BACKOFF_SECS") {
            let secs: u32 = parse_number("LEARNER_SUPPORT_MAX_BACKOFF_SECS", &raw)?;
            config.retry.max_delay = Duration::from_secs(u64::from(secs));
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` when `raw` is not an absolute url.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Absolute url of the JWT refresh endpoint.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` when the configured path cannot be joined.
    pub fn refresh_url(&self) -> Result<Url, url::ParseError> {
        self.base_url.join(&self.refresh_endpoint)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        raw: raw.to_string(),
        source,
    })
}

fn parse_number(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        raw: raw.to_string(),
    })
}
