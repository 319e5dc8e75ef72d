//! Client configuration.
//!
//! Resolution order: defaults, then an optional JSON settings file
//! (same camelCase keys as the web page's `APP_CONFIG`), then environment
//! variables. Hosts apply their own overrides (CLI flags) last.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};

/// Origin used when no API base is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_KEY: &str = "hihiton-web-session";
pub const DEFAULT_MESSAGES_KEY: &str = "hihiton-web-messages";

pub const ENV_API_BASE_URL: &str = "HIHITON_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "HIHITON_REQUEST_TIMEOUT_SECS";

/// User-facing strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiText {
    pub status_ready: String,
    pub status_busy: String,
    pub status_error: String,
    /// Prefix of an error message; the failure detail follows
    pub error_prefix: String,
    /// Detail used when an error body carries no usable `detail`
    pub unknown_error: String,
    /// Detail recorded when a request is dropped before its reply arrives
    pub request_cancelled: String,
    pub placeholder_greeting: String,
    pub user_label: String,
    pub bot_label: String,
    pub csv_link_label: String,
    pub image_link_label: String,
    pub image_alt: String,
}

impl Default for UiText {
    fn default() -> Self {
        Self {
            status_ready: "Ready".to_string(),
            status_busy: "Processing request...".to_string(),
            status_error: "Request failed".to_string(),
            error_prefix: "Failed to process request: ".to_string(),
            unknown_error: "Unknown error".to_string(),
            request_cancelled: "Request cancelled".to_string(),
            placeholder_greeting: "Hello! Ask a question to get data. \
                CSV tables and charts will be shown right here."
                .to_string(),
            user_label: "You".to_string(),
            bot_label: "Bot".to_string(),
            csv_link_label: "Download CSV".to_string(),
            image_link_label: "Download image".to_string(),
            image_alt: "Result image".to_string(),
        }
    }
}

/// Configuration for one chat client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL of the chat API, without trailing slash
    pub api_base_url: String,
    pub session_key: String,
    pub messages_key: String,
    /// Abort a chat request after this many seconds (none by default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub ui: UiText,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            messages_key: DEFAULT_MESSAGES_KEY.to_string(),
            request_timeout_secs: None,
            ui: UiText::default(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `origin`
    pub fn new(origin: impl Into<String>) -> Self {
        Self::default().with_api_base(origin)
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = normalize_base(&base.into());
        self
    }

    pub fn with_request_timeout(mut self, secs: Option<u64>) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Load a JSON settings file; missing keys keep their defaults
    pub fn from_settings(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ChatError::Config(format!("invalid {}: {}", path.display(), e)))?;
        debug!("Loaded settings from {}", path.display());
        let base = config.api_base_url.clone();
        Ok(config.with_api_base(base))
    }

    /// Apply `HIHITON_*` environment overrides
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self = self.with_api_base(base);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.request_timeout_secs = None,
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => warn!("Ignoring invalid {}={}", ENV_REQUEST_TIMEOUT, raw),
            }
        }
        self
    }

    /// `{api_base}/api/chat`
    pub fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.api_base_url)
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = ClientConfig::new("https://x.test/");
        assert_eq!(config.api_base_url, "https://x.test");
        assert_eq!(config.chat_endpoint(), "https://x.test/api/chat");
    }

    #[test]
    fn test_settings_file_partial() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"apiBaseUrl": "https://api.example.com/", "ui": {"statusReady": "Готов к работе"}}"#,
        )
        .unwrap();

        let config = ClientConfig::from_settings(&path).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.ui.status_ready, "Готов к работе");
        assert_eq!(config.ui.status_busy, UiText::default().status_busy);
        assert_eq!(config.messages_key, DEFAULT_MESSAGES_KEY);
    }

    #[test]
    fn test_settings_file_invalid() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            ClientConfig::from_settings(&path),
            Err(ChatError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_BASE_URL, "https://env.test/"),
            (ENV_REQUEST_TIMEOUT, "30"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::default()
            .apply_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "https://env.test");
        assert_eq!(config.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_env_invalid_timeout_ignored() {
        let config = ClientConfig::default()
            .with_request_timeout(Some(5))
            .apply_vars(|name| (name == ENV_REQUEST_TIMEOUT).then(|| "soon".to_string()));
        assert_eq!(config.request_timeout_secs, Some(5));
    }
}
