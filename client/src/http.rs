//! HTTP client for the registry's GraphQL endpoint.

use crate::error::ClientError;
use crate::query::{extract_data, GraphQlQuery, QueryClient};

use serde_json::Value;
use std::time::Duration;

/// Default timeout for a whole registry request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a Snapshot-style GraphQL hub.
///
/// Sends `POST {endpoint}` with a JSON `{"query", "variables"}` body and
/// unwraps the response envelope.
#[derive(Clone)]
pub struct HttpQueryClient {
    /// HTTP client (reusable connection pool).
    http: reqwest::Client,
    endpoint: String,
}

impl HttpQueryClient {
    /// Create a client with default timeout settings.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeouts(endpoint, DEFAULT_REQUEST_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with custom request and connect timeouts.
    pub fn with_timeouts(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("tally/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QueryClient for HttpQueryClient {
    async fn query(&self, query: &GraphQlQuery) -> Result<Value, ClientError> {
        tracing::trace!(endpoint = %self.endpoint, field = query.root_field(), "registry request");

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&query.to_body())
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // GraphQL servers reject bad queries with a 4xx and an `errors` body.
            if let Ok(body) = response.json::<Value>().await {
                if let Err(e @ ClientError::Protocol(_)) = extract_data(body) {
                    return Err(e);
                }
            }
            return Err(ClientError::Transport(format!("HTTP status {status}")));
        }
        if !status.is_success() {
            return Err(ClientError::Transport(format!("HTTP status {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(format!("invalid JSON response: {e}")))?;

        extract_data(body)
    }
}
