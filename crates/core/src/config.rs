//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the services that
//! need it. Nothing in this crate reads environment variables while handling a search.

use crate::constants::{DEFAULT_MATCHING_FUNCTION, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{ConfigError, ConfigResult};
use medir_types::NonEmptyText;
use std::time::Duration;

/// Backend connection settings resolved at startup.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    backend_url: NonEmptyText,
    anon_key: NonEmptyText,
    access_token: Option<String>,
    matching_function: NonEmptyText,
    request_timeout: Duration,
}

impl DiscoveryConfig {
    /// Create a new `DiscoveryConfig`.
    ///
    /// `access_token` is the signed-in user's session token; when absent the anonymous key is
    /// sent as the bearer credential instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInput`] if the backend URL or key is empty, or if the URL
    /// does not use http(s).
    pub fn new(
        backend_url: &str,
        anon_key: &str,
        access_token: Option<String>,
        matching_function: Option<String>,
        request_timeout: Duration,
    ) -> ConfigResult<Self> {
        let backend_url = NonEmptyText::new(backend_url.trim_end_matches('/'))
            .map_err(|_| ConfigError::InvalidInput("backend url cannot be empty".into()))?;
        if !(backend_url.as_str().starts_with("http://")
            || backend_url.as_str().starts_with("https://"))
        {
            return Err(ConfigError::InvalidInput(format!(
                "backend url must start with http:// or https://, got: '{backend_url}'"
            )));
        }

        let anon_key = NonEmptyText::new(anon_key)
            .map_err(|_| ConfigError::InvalidInput("anon key cannot be empty".into()))?;

        let matching_function = matching_function
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_MATCHING_FUNCTION);
        let matching_function = NonEmptyText::new(matching_function)
            .map_err(|_| ConfigError::InvalidInput("matching function cannot be empty".into()))?;

        Ok(Self {
            backend_url,
            anon_key,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            matching_function,
            request_timeout,
        })
    }

    pub fn backend_url(&self) -> &str {
        self.backend_url.as_str()
    }

    pub fn anon_key(&self) -> &str {
        self.anon_key.as_str()
    }

    /// Credential sent as `Authorization: Bearer ...`.
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_deref()
            .unwrap_or_else(|| self.anon_key.as_str())
    }

    pub fn matching_function(&self) -> &str {
        self.matching_function.as_str()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Parse the request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_REQUEST_TIMEOUT`].
pub fn request_timeout_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(DEFAULT_REQUEST_TIMEOUT);
    };

    let secs: u64 = value.parse().map_err(|_| {
        ConfigError::InvalidInput(format!(
            "request timeout must be a whole number of seconds, got: '{value}'"
        ))
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidInput(
            "request timeout must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_secs(secs))
}
