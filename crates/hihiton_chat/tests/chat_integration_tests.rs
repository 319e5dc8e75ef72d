//! Integration tests against a mock HTTP chat API.

use std::sync::Arc;

use hihiton_chat::{
    ChatApp, ClientConfig, ControllerState, FileStorage, HttpTransport, KeyValueStorage,
    MemoryStorage, MessageStore, Sender, SharedStorage, StatusIndicator,
};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_scope() -> Option<SharedStorage> {
    Some(Arc::new(MemoryStorage::new()))
}

#[tokio::test]
async fn test_hello_roundtrip_over_http() {
    let server = MockServer::start().await;
    let app = ChatApp::start_http(ClientConfig::new(server.uri()), memory_scope()).unwrap();
    let session_id = app.controller().session_id().to_string();

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({ "message": "hello", "session_id": session_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hi" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = app.controller().submit("hello").await;
    assert!(outcome.is_accepted());

    let messages = app.controller().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[1].sender, Sender::Bot);
    assert_eq!(messages[1].text, "hi");

    assert_eq!(app.controller().status(), StatusIndicator::Ready);
    assert_eq!(app.controller().state(), ControllerState::Idle);
    assert!(app.controller().input().enabled);
}

#[tokio::test]
async fn test_rate_limited_detail_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "detail": "rate limited" })))
        .mount(&server)
        .await;

    let app = ChatApp::start_http(ClientConfig::new(server.uri()), None).unwrap();
    let reply = app.controller().submit("hello").await.reply().cloned().unwrap();

    assert!(reply.is_error);
    assert!(reply.text.contains("rate limited"));
    assert_eq!(app.controller().status(), StatusIndicator::Error);
    assert!(app.controller().input().enabled);
}

#[tokio::test]
async fn test_error_without_json_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error page"))
        .mount(&server)
        .await;

    let app = ChatApp::start_http(ClientConfig::new(server.uri()), None).unwrap();
    let reply = app.controller().submit("hello").await.reply().cloned().unwrap();

    assert!(reply.is_error);
    assert!(reply.text.ends_with("Internal Server Error"));
}

#[tokio::test]
async fn test_unreachable_server_becomes_error_message() {
    // Nothing listens on port 1
    let app = ChatApp::start_http(ClientConfig::new("http://127.0.0.1:1"), None).unwrap();
    let reply = app.controller().submit("hello").await.reply().cloned().unwrap();

    assert!(reply.is_error);
    assert!(reply.text.contains("Network error"));
    assert_eq!(app.controller().state(), ControllerState::Idle);
}

#[tokio::test]
async fn test_attachment_links_resolved_against_api_base() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Here is your report",
            "csv": {
                "headers": ["region", "total"],
                "rows": [["north", "10"], ["south", "7"]],
                "download_url": "/files/a.csv"
            },
            "png": {
                "downloadUrl": "/api/download/png",
                "image_base64": "iVBORw0KGgo="
            }
        })))
        .mount(&server)
        .await;

    // Links resolve against x.test while the transport talks to the mock server
    let transport = HttpTransport::new(&ClientConfig::new(server.uri())).unwrap();
    let app = ChatApp::start(ClientConfig::new("https://x.test"), None, Arc::new(transport));

    let reply = app.controller().submit("report").await.reply().cloned().unwrap();
    let csv = reply.csv_attachment.unwrap();
    assert_eq!(csv.download_url, "https://x.test/files/a.csv");
    assert_eq!(csv.headers, vec!["region", "total"]);
    assert_eq!(csv.rows.len(), 2);

    let image = reply.image_attachment.unwrap();
    assert_eq!(image.download_url, "https://x.test/api/download/png");
    assert!(image.inline_image.as_data_url().starts_with("data:image/png;base64,"));

    let entries = app.render();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].table.as_ref().unwrap().link.href,
        "https://x.test/files/a.csv"
    );
}

#[tokio::test]
async fn test_download_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
        .mount(&server)
        .await;

    let app = ChatApp::start_http(ClientConfig::new(server.uri()), None).unwrap();
    let url = app.controller().resolver().resolve_url("/api/download/csv");
    let bytes = app.controller().transport().download(&url).await.unwrap();
    assert_eq!(bytes, b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_log_persists_across_restarts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "pong" })))
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let scope = || -> Option<SharedStorage> {
        Some(Arc::new(FileStorage::open(temp.path()).unwrap()))
    };

    let before = {
        let app = ChatApp::start_http(ClientConfig::new(server.uri()), scope()).unwrap();
        app.controller().submit("ping").await;
        app.controller().submit("ping again").await;
        (app.controller().session_id().to_string(), app.controller().messages())
    };

    let app = ChatApp::start_http(ClientConfig::new(server.uri()), scope()).unwrap();
    assert_eq!(app.controller().session_id(), before.0);
    assert_eq!(app.controller().messages(), before.1);
    assert_eq!(app.controller().messages().len(), 4);
}

#[test]
fn test_corrupt_snapshot_is_empty_store() {
    let storage = MemoryStorage::new();
    storage.set_item("hihiton-web-messages", "[{\"id\": 1,").unwrap();

    let store = MessageStore::load(Some(Arc::new(storage)), "hihiton-web-messages");
    assert!(store.is_empty());
}
