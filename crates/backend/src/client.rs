use medir_core::{DiscoveryConfig, FetchError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Authenticated HTTP access to the backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    config: Arc<DiscoveryConfig>,
}

impl BackendClient {
    pub fn new(config: DiscoveryConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.backend_url(), path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorise(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorise(self.http.post(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorise(self.http.delete(self.url(path)))
    }

    fn authorise(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.config.anon_key())
            .bearer_auth(self.config.bearer_token())
            .header("Accept", "application/json")
    }
}

/// Sends `request` and decodes a successful JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    what: &str,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.send().await.map_err(transport_error)?;
    read_json(what, response).await
}

async fn read_json<T: DeserializeOwned>(what: &str, response: Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }

    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| FetchError::decode(what, e))
}

/// Builds the error for a non-success response.
///
/// PostgREST puts a human-readable `message` in its error bodies; otherwise the status reason is
/// used.
pub(crate) fn status_error(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    FetchError::with_status(status.as_u16(), message)
}

pub(crate) fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::new(format!("request timed out: {err}"))
    } else {
        FetchError::new(format!("could not reach the backend: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_error_prefers_postgrest_message() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":"42703","message":"column doctors.nme does not exist"}"#,
        );
        assert_eq!(err.status, Some(400));
        assert_eq!(err.to_string(), "error 400: column doctors.nme does not exist");
    }

    #[test]
    fn status_error_falls_back_to_reason() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.to_string(), "error 500: Internal Server Error");

        let err = status_error(StatusCode::UNAUTHORIZED, r#"{"message":""}"#);
        assert_eq!(err.to_string(), "error 401: Unauthorized");
    }

    #[test]
    fn urls_are_joined_to_the_base() {
        let config = DiscoveryConfig::new(
            "https://directory.example.org/",
            "anon",
            None,
            None,
            Duration::from_secs(10),
        )
        .expect("config");
        let client = BackendClient::new(config).expect("client");
        assert_eq!(
            client.url("/rest/v1/doctors"),
            "https://directory.example.org/rest/v1/doctors"
        );
    }
}
