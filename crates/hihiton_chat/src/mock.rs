//! Mock chat transport for testing.
//!
//! Provides a scripted implementation of the ChatTransport trait for unit
//! tests and offline hosts, without a running chat API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;

use crate::error::{ChatError, ChatResult};
use crate::transport::{ChatTransport, TransportResponse};
use crate::types::ChatRequest;

/// Predefined outcome for a `post_chat` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// The server answered (any status)
    Response(TransportResponse),
    /// The request never produced a response
    NetworkError(String),
}

impl MockReply {
    /// 200 with a JSON body
    pub fn ok(body: serde_json::Value) -> Self {
        Self::json(200, body)
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Response(TransportResponse::new(status, body.to_string()))
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self::Response(TransportResponse::new(status, body))
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError(message.into())
    }
}

/// Scripted transport that records every request.
#[derive(Clone)]
pub struct MockTransport {
    /// Predefined replies, served in order and cycled.
    replies: Arc<RwLock<Vec<MockReply>>>,
    /// Index of next reply to serve.
    reply_index: Arc<AtomicUsize>,
    /// Captured chat requests for verification.
    captured: Arc<RwLock<Vec<ChatRequest>>>,
    /// Captured download URLs.
    downloads: Arc<RwLock<Vec<String>>>,
    /// Bytes served by `download`.
    download_body: Arc<RwLock<Vec<u8>>>,
    /// When set, `post_chat` waits here before replying.
    gate: Arc<RwLock<Option<Arc<Notify>>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(RwLock::new(Vec::new())),
            reply_index: Arc::new(AtomicUsize::new(0)),
            captured: Arc::new(RwLock::new(Vec::new())),
            downloads: Arc::new(RwLock::new(Vec::new())),
            download_body: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a reply for the next post_chat call.
    pub fn add_reply(self, reply: MockReply) -> Self {
        self.replies.write().push(reply);
        self
    }

    pub fn with_replies(self, replies: Vec<MockReply>) -> Self {
        *self.replies.write() = replies;
        self
    }

    pub fn with_download_body(self, body: impl Into<Vec<u8>>) -> Self {
        *self.download_body.write() = body.into();
        self
    }

    /// Hold every reply until the returned handle is notified.
    pub fn hold_replies(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.write() = Some(Arc::clone(&gate));
        gate
    }

    /// Stop holding replies; later calls answer immediately.
    pub fn release_replies(&self) {
        if let Some(gate) = self.gate.write().take() {
            gate.notify_waiters();
        }
    }

    /// Get all captured chat requests.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.captured.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.read().clone()
    }

    fn next_reply(&self) -> MockReply {
        let replies = self.replies.read();
        if replies.is_empty() {
            return MockReply::ok(serde_json::json!({ "text": "" }));
        }
        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        replies[index % replies.len()].clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn post_chat(&self, request: &ChatRequest) -> ChatResult<TransportResponse> {
        self.captured.write().push(request.clone());

        let gate = self.gate.read().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.next_reply() {
            MockReply::Response(response) => Ok(response),
            MockReply::NetworkError(message) => Err(ChatError::Transport(message)),
        }
    }

    async fn download(&self, url: &str) -> ChatResult<Vec<u8>> {
        self.downloads.write().push(url.to_string());
        Ok(self.download_body.read().clone())
    }
}
