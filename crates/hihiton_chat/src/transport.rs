//! HTTP transport to the chat API.
//!
//! The transport only moves bytes: it reports status and raw body and leaves
//! interpretation (success parsing, error detail extraction) to the
//! controller.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ChatError, ChatResult};
use crate::types::ChatRequest;

/// Raw outcome of an HTTP exchange that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Reason phrase for the status (may be empty)
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Canonical reason phrase for an HTTP status code, or empty
pub fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

/// Something that can carry a chat request to the remote endpoint
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `POST /api/chat`. `Err` only for failures that produced no response.
    async fn post_chat(&self, request: &ChatRequest) -> ChatResult<TransportResponse>;

    /// Fetch an attachment link
    async fn download(&self, url: &str) -> ChatResult<Vec<u8>>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ChatResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.chat_endpoint(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(&self, request: &ChatRequest) -> ChatResult<TransportResponse> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("Network error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(format!("Network error: {}", e)))?;
        debug!("POST {} -> {}", self.endpoint, status);

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    async fn download(&self, url: &str) -> ChatResult<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Transport(format!(
                "Download failed with status {}",
                status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
