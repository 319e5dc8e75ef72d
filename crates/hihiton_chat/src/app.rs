//! Startup wiring: probe storage, resolve the session, hydrate the log,
//! and hand everything to a controller.

use std::sync::Arc;

use tracing::info;

use crate::attachments::AttachmentResolver;
use crate::config::ClientConfig;
use crate::controller::RequestController;
use crate::error::ChatResult;
use crate::render::{render_log, RenderedEntry};
use crate::session::SessionIdentity;
use crate::storage::{probe, SharedStorage};
use crate::store::MessageStore;
use crate::transport::{ChatTransport, HttpTransport};

/// A started chat client
pub struct ChatApp {
    config: ClientConfig,
    controller: RequestController,
}

impl ChatApp {
    /// Start against any transport. `storage` is probed first; an unusable
    /// medium puts the app in degraded mode.
    pub fn start(
        config: ClientConfig,
        storage: Option<SharedStorage>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        let storage = storage.and_then(probe);

        let session = SessionIdentity::get_or_create(storage.as_deref(), &config.session_key);
        let store = Arc::new(MessageStore::load(storage, config.messages_key.clone()));
        info!(
            "Session {} ({} message(s){})",
            session,
            store.len(),
            if session.is_ephemeral() { ", ephemeral" } else { "" }
        );

        let controller = RequestController::new(
            session,
            store,
            AttachmentResolver::new(&config.api_base_url),
            transport,
            config.ui.clone(),
        );

        Self { config, controller }
    }

    /// Start against the HTTP chat API named in `config`
    pub fn start_http(config: ClientConfig, storage: Option<SharedStorage>) -> ChatResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::start(config, storage, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn controller(&self) -> &RequestController {
        &self.controller
    }

    /// Current log as paint-ready entries
    pub fn render(&self) -> Vec<RenderedEntry> {
        render_log(&self.controller.messages(), &self.config.ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::mock::{MockReply, MockTransport};
    use crate::storage::{KeyValueStorage, MemoryStorage, MockKeyValueStorage};

    #[tokio::test]
    async fn test_reload_resumes_session_and_log() {
        let storage = MemoryStorage::new();
        let shared: SharedStorage = Arc::new(storage.clone());
        let transport =
            MockTransport::new().add_reply(MockReply::ok(serde_json::json!({ "text": "hi" })));

        let first = ChatApp::start(
            ClientConfig::default(),
            Some(shared.clone()),
            Arc::new(transport.clone()),
        );
        first.controller().submit("hello").await;
        let session_id = first.controller().session_id().to_string();

        let second = ChatApp::start(ClientConfig::default(), Some(shared), Arc::new(transport));
        assert_eq!(second.controller().session_id(), session_id);
        assert_eq!(second.controller().messages(), first.controller().messages());
        assert!(storage.get_item("hihiton-web-messages").unwrap().is_some());
    }

    #[test]
    fn test_failing_medium_runs_degraded() {
        let mut mock = MockKeyValueStorage::new();
        mock.expect_set_item()
            .returning(|_, _| Err(ChatError::Persistence("disabled".into())));
        let shared: SharedStorage = Arc::new(mock);

        let app = ChatApp::start(
            ClientConfig::default(),
            Some(shared),
            Arc::new(MockTransport::new()),
        );
        assert!(app.controller().session().is_ephemeral());
        assert!(!app.controller().store().is_persistent());
    }

    #[test]
    fn test_fresh_app_renders_placeholder() {
        let app = ChatApp::start(
            ClientConfig::default(),
            None,
            Arc::new(MockTransport::new()),
        );
        let entries = app.render();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_placeholder);
    }
}
