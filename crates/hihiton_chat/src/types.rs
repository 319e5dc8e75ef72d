//! Core types for the chat client.
//!
//! Persisted field names follow the browser client's snapshot format
//! (`csv`, `png`, `downloadUrl`, `dataUrl`, `isError`) so that a log written
//! by either side can be hydrated by the other.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Unique identifier for a chat session
pub type SessionId = String;

/// Who produced a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// CSS-style modifier used by presentation (`message--user`, `message--bot`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Tabular attachment, normalized and link-resolved
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvAttachment {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    /// Absolute link to the full file
    #[serde(rename = "downloadUrl", default)]
    pub download_url: String,
}

/// A displayable inline image, held as a `data:` URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct InlineImage(String);

impl InlineImage {
    pub const DEFAULT_MIME: &'static str = "image/png";

    /// Build a data URL from a MIME type and an already base64-encoded body
    pub fn from_base64(mime: &str, body: &str) -> Self {
        Self(format!("data:{};base64,{}", mime, body))
    }

    /// The full `data:` URL, usable directly as an image source
    pub fn as_data_url(&self) -> &str {
        &self.0
    }
}

/// Image attachment, normalized and link-resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Absolute link to the full image
    #[serde(rename = "downloadUrl", default)]
    pub download_url: String,
    #[serde(rename = "dataUrl")]
    pub inline_image: InlineImage,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    pub sender: Sender,
    #[serde(default)]
    pub text: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(
        rename = "csv",
        alias = "csvAttachment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub csv_attachment: Option<CsvAttachment>,
    #[serde(
        rename = "png",
        alias = "imageAttachment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_attachment: Option<ImageAttachment>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Mint a new message/session identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            sender,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
            csv_attachment: None,
            image_attachment: None,
            is_error: false,
        }
    }

    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create a new bot reply
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Create a bot message describing a failed request
    pub fn bot_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Sender::Bot, text)
        }
    }

    pub fn with_csv(mut self, csv: Option<CsvAttachment>) -> Self {
        self.csv_attachment = csv;
        self
    }

    pub fn with_image(mut self, image: Option<ImageAttachment>) -> Self {
        self.image_attachment = image;
        self
    }
}

// =========================================================================
// Wire types
// =========================================================================

/// Outbound body for `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: SessionId,
}

/// Attachment link as sent by the server, which may spell the field either way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttachmentRef {
    download_url: Option<String>,
    download_url_camel: Option<String>,
}

impl RawAttachmentRef {
    pub fn new(download_url: Option<String>, download_url_camel: Option<String>) -> Self {
        Self {
            download_url,
            download_url_camel,
        }
    }

    /// Read both spellings from an attachment object; non-string values are ignored
    pub fn from_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let text = |key: &str| {
            object
                .get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        Self::new(text("download_url"), text("downloadUrl"))
    }

    /// The single place the two spellings are reconciled; snake_case wins.
    pub fn download_ref(&self) -> Option<&str> {
        self.download_url
            .as_deref()
            .or(self.download_url_camel.as_deref())
    }
}

/// `csv` object of a successful reply, with cells already coerced to text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub link: RawAttachmentRef,
}

/// `png` object of a successful reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawImage {
    pub image_base64: Option<String>,
    pub link: RawAttachmentRef,
}

/// Body of a successful `POST /api/chat`.
///
/// Attachments stay untyped here so that a malformed one cannot fail the
/// whole reply; the attachment resolver salvages what it can.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub csv: Option<serde_json::Value>,
    #[serde(default)]
    pub png: Option<serde_json::Value>,
}
