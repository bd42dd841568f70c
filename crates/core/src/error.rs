use std::time::Duration;

/// A network or service failure reported by a collaborator.
///
/// Carries the message shown to the user and, when the failure came from an HTTP response, its
/// status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render_fetch_error(.status, .message))]
pub struct FetchError {
    pub message: String,
    pub status: Option<u16>,
}

fn render_fetch_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("error {code}: {message}"),
        None => message.to_owned(),
    }
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(format!("request timed out after {}s", limit.as_secs_f64()))
    }

    /// A row or response body that did not have the expected shape.
    pub fn decode(what: &str, err: serde_json::Error) -> Self {
        Self::new(format!("unexpected {what} data: {err}"))
    }
}

/// Input the core refuses to act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("could not determine the city of the selected location")]
    UnresolvedCity,
    #[error("city cannot be empty")]
    EmptyCity,
    #[error("the selected place has no place id")]
    MissingPlace,
    #[error("this location is already registered for the doctor")]
    DuplicateLocation,
    #[error("location not found")]
    LocationNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_renders_status_when_present() {
        let err = FetchError::with_status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "error 503: Service Unavailable");
        assert_eq!(FetchError::new("offline").to_string(), "offline");
    }

    #[test]
    fn discovery_error_is_transparent() {
        let err: DiscoveryError = ValidationError::UnresolvedCity.into();
        assert_eq!(
            err.to_string(),
            "could not determine the city of the selected location"
        );
    }
}
