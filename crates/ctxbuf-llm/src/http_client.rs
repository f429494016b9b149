//! Shared HTTP client for HTTP-based providers.
//!
//! Requests are sent once. There is no retry or backoff at this layer; the
//! caller decides whether to repeat a whole selection.

use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use ctxbuf_utils::error::LlmError;
use ctxbuf_utils::redaction::redact_error_message;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// Start a GET request on the shared client.
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    /// Start a POST request on the shared client.
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    /// Send one request with `min(request_timeout, max_timeout)`.
    ///
    /// - 401/403 → `ProviderAuth`
    /// - 429 → `ProviderQuota`
    /// - 5xx → `ProviderOutage`
    /// - timeouts → `Timeout`
    /// - everything else → `Transport`
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| {
                LlmError::Transport(format!(
                    "Failed to build request: {}",
                    redact_error_message(&e.to_string())
                ))
            })?;

        debug!(
            provider = provider_name,
            url = %redact_error_message(request.url().as_str()),
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    return Err(map_status_error(status, provider_name));
                }
                Ok(response)
            }
            Err(e) if e.is_timeout() => Err(LlmError::Timeout {
                duration: effective_timeout,
            }),
            Err(e) => Err(LlmError::Transport(format!(
                "{} request failed: {}",
                provider_name,
                redact_error_message(&e.to_string())
            ))),
        }
    }
}

/// Map an HTTP error status to an `LlmError` variant.
fn map_status_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        s if s.is_server_error() => {
            LlmError::ProviderOutage(format!("{provider_name} returned server error: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        let client = HttpClient::with_max_timeout(Duration::from_secs(60)).unwrap();
        assert_eq!(client.max_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, "p"),
            LlmError::ProviderAuth(msg) if msg.contains("401")
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, "p"),
            LlmError::ProviderAuth(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "p"),
            LlmError::ProviderQuota(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, "p"),
            LlmError::ProviderOutage(msg) if msg.contains("502")
        ));
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, "p"),
            LlmError::Transport(msg) if msg.contains("client error")
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = HttpClient::new().unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let request = client.get("http://127.0.0.1:9/api/v1/models");
        let err = client
            .execute(request, Duration::from_secs(5), "test")
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Transport(_) | LlmError::Timeout { .. }));
    }
}
