//! Client configuration.

use reqwest::Client;
use std::time::Duration;
use url::Url;
use vos_review_core::{ApiError, ApiResult};

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default path prefix of the versioned API.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Default timeout for REST calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend address, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Path prefix of the versioned API.
    pub api_prefix: String,
    /// Timeout for REST calls. Review streams are not bounded by it.
    pub request_timeout: Duration,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Token sent on POST, PUT, PATCH and DELETE.
    pub csrf_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: concat!("vos-review/", env!("CARGO_PKG_VERSION")).to_string(),
            csrf_token: None,
        }
    }
}

impl ClientConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend address.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API path prefix.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set the REST call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the CSRF token.
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Load from environment variables.
    ///
    /// Looks for:
    /// - `VOS_API_URL`
    /// - `VOS_API_PREFIX`
    /// - `VOS_REQUEST_TIMEOUT_SECS`
    /// - `VOS_CONNECT_TIMEOUT_SECS`
    /// - `VOS_CSRF_TOKEN`
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key-value source using the `from_env` keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("VOS_API_URL") {
            match Url::parse(&raw) {
                Ok(_) => config.base_url = raw,
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "Ignoring invalid VOS_API_URL");
                }
            }
        }
        if let Some(prefix) = lookup("VOS_API_PREFIX") {
            config.api_prefix = prefix;
        }
        if let Some(timeout) = secs(&lookup, "VOS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = secs(&lookup, "VOS_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = timeout;
        }
        config.csrf_token = lookup("VOS_CSRF_TOKEN").filter(|t| !t.is_empty());

        config
    }

    /// Build the URL of an API endpoint from its path segments.
    ///
    /// Segments are percent-encoded, so identifiers may contain any
    /// character. An empty last segment produces a trailing slash, which
    /// the backend's collection routes expect.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ApiError::invalid_request(format!("Invalid base URL {:?}: {err}", self.base_url))
        })?;
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ApiError::invalid_request(format!("Base URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty();
            path.extend(self.api_prefix.split('/').filter(|s| !s.is_empty()));
            path.extend(segments);
        }
        Ok(url)
    }

    /// Build an HTTP client with this config.
    ///
    /// Only the connect phase is bounded here; REST calls apply
    /// `request_timeout` per request so review streams can stay open.
    pub fn build_client(&self) -> ApiResult<Client> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|err| ApiError::transport(format!("Failed to build HTTP client: {err}")))
    }
}

fn secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "Ignoring invalid timeout");
            None
        }
    }
}
