//! Normalization of reply attachments into renderable form.
//!
//! Links are made absolute against the API base. Anything that cannot be
//! resolved or decoded degrades to its raw form; an attachment never fails
//! the message that carries it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ChatError, ChatResult};
use crate::types::{
    ChatReply, CsvAttachment, ImageAttachment, InlineImage, RawAttachmentRef, RawCsv, RawImage,
};

/// A successful reply with its attachments normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReply {
    pub text: String,
    pub csv: Option<CsvAttachment>,
    pub image: Option<ImageAttachment>,
}

/// Resolves attachment payloads against the configured API base
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    api_base: String,
    base_url: Option<Url>,
}

impl AttachmentResolver {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let base_url = match Url::parse(&format!("{}/", api_base)) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("API base '{}' is not a valid URL: {}", api_base, e);
                None
            }
        };
        Self { api_base, base_url }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Resolve `reference` to an absolute URL, reporting why it failed
    pub fn try_resolve(&self, reference: &str) -> ChatResult<String> {
        let base = self.base_url.as_ref().ok_or_else(|| ChatError::Resolution {
            reference: reference.to_string(),
            reason: format!("invalid API base '{}'", self.api_base),
        })?;
        base.join(reference)
            .map(|url| url.to_string())
            .map_err(|e| ChatError::Resolution {
                reference: reference.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve `reference`, falling back to the raw string
    pub fn resolve_url(&self, reference: &str) -> String {
        match self.try_resolve(reference) {
            Ok(url) => url,
            Err(e) => {
                debug!("{}", e);
                reference.to_string()
            }
        }
    }

    pub fn resolve_csv(&self, raw: RawCsv) -> CsvAttachment {
        CsvAttachment {
            download_url: self.resolve_url(raw.link.download_ref().unwrap_or_default()),
            headers: raw.headers,
            rows: raw.rows,
        }
    }

    pub fn resolve_image(&self, raw: RawImage) -> ImageAttachment {
        ImageAttachment {
            download_url: self.resolve_url(raw.link.download_ref().unwrap_or_default()),
            inline_image: decode_inline_image(raw.image_base64.as_deref().unwrap_or_default()),
        }
    }

    pub fn resolve_reply(&self, reply: ChatReply) -> ResolvedReply {
        ResolvedReply {
            text: reply.text.unwrap_or_default(),
            csv: reply
                .csv
                .as_ref()
                .and_then(parse_csv)
                .map(|raw| self.resolve_csv(raw)),
            image: reply
                .png
                .as_ref()
                .and_then(parse_image)
                .map(|raw| self.resolve_image(raw)),
        }
    }
}

/// Salvage a `csv` payload. Scalar cells become text; only a payload that
/// is not an object is dropped.
pub fn parse_csv(value: &Value) -> Option<RawCsv> {
    let Some(object) = value.as_object() else {
        warn!("Dropping csv attachment that is not an object: {}", value);
        return None;
    };

    let headers: Vec<String> = match object.get("headers") {
        Some(Value::Array(cells)) => cells.iter().map(cell_text).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Ignoring csv headers that are not a list: {}", other);
            Vec::new()
        }
    };

    let rows: Vec<Vec<String>> = match object.get("rows") {
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(|row| match row {
                Value::Array(cells) => Some(cells.iter().map(cell_text).collect()),
                other => {
                    warn!("Skipping csv row that is not a list: {}", other);
                    None
                }
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Ignoring csv rows that are not a list: {}", other);
            Vec::new()
        }
    };

    Some(RawCsv {
        headers,
        rows,
        link: RawAttachmentRef::from_object(object),
    })
}

/// Salvage a `png` payload; only a payload that is not an object is dropped.
pub fn parse_image(value: &Value) -> Option<RawImage> {
    let Some(object) = value.as_object() else {
        warn!("Dropping png attachment that is not an object: {}", value);
        return None;
    };

    let image_base64 = match object.get("image_base64") {
        Some(Value::String(body)) => Some(body.clone()),
        Some(Value::Null) | None => None,
        Some(other) => {
            warn!("Ignoring png body that is not a string: {}", other);
            None
        }
    };

    Some(RawImage {
        image_base64,
        link: RawAttachmentRef::from_object(object),
    })
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn a base64 image body into a data URL with a sniffed MIME type
pub fn decode_inline_image(body: &str) -> InlineImage {
    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let mime = match STANDARD.decode(&body) {
        Ok(bytes) => sniff_image_mime(&bytes),
        Err(e) => {
            warn!("Inline image is not valid base64, showing as-is: {}", e);
            InlineImage::DEFAULT_MIME
        }
    };
    InlineImage::from_base64(mime, &body)
}

fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = b"\xFF\xD8\xFF";
    const GIF: &[u8] = b"GIF8";

    if bytes.starts_with(PNG) {
        "image/png"
    } else if bytes.starts_with(JPEG) {
        "image/jpeg"
    } else if bytes.starts_with(GIF) {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        InlineImage::DEFAULT_MIME
    }
}
