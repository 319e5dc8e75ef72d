//! Presentation view model.
//!
//! Turns the message log into paint-ready entries. The host decides how to
//! draw them (DOM nodes, terminal lines); this module only decides what is
//! shown.

use chrono::{Local, TimeZone, Utc};

use crate::config::UiText;
use crate::types::{CsvAttachment, ImageAttachment, Message, Sender};

/// A link that opens an attachment in a new context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub label: String,
    pub target: &'static str,
    pub rel: &'static str,
}

impl DownloadLink {
    fn new(href: &str, label: &str) -> Self {
        Self {
            href: href.to_string(),
            label: label.to_string(),
            target: "_blank",
            rel: "noopener noreferrer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub link: DownloadLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    /// Data URL of the inline image
    pub src: String,
    pub alt: String,
    pub link: DownloadLink,
}

/// One painted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub sender: Sender,
    pub classes: Vec<String>,
    pub meta: String,
    pub text: String,
    pub table: Option<TablePreview>,
    pub image: Option<ImagePreview>,
    pub is_placeholder: bool,
}

/// Render the whole log. An empty log renders a single greeting entry.
pub fn render_log(messages: &[Message], ui: &UiText) -> Vec<RenderedEntry> {
    if messages.is_empty() {
        return vec![placeholder(ui)];
    }
    messages.iter().map(|m| render_message(m, ui)).collect()
}

fn placeholder(ui: &UiText) -> RenderedEntry {
    RenderedEntry {
        sender: Sender::Bot,
        classes: vec!["message".to_string(), "message--bot".to_string()],
        meta: ui.bot_label.to_lowercase(),
        text: ui.placeholder_greeting.clone(),
        table: None,
        image: None,
        is_placeholder: true,
    }
}

pub fn render_message(message: &Message, ui: &UiText) -> RenderedEntry {
    render_message_in(message, ui, &Local)
}

fn render_message_in<Tz: TimeZone>(message: &Message, ui: &UiText, tz: &Tz) -> RenderedEntry
where
    Tz::Offset: std::fmt::Display,
{
    let mut classes = vec![
        "message".to_string(),
        format!("message--{}", message.sender.as_str()),
    ];
    if message.is_error {
        classes.push("message--error".to_string());
    }

    let label = match message.sender {
        Sender::User => &ui.user_label,
        Sender::Bot => &ui.bot_label,
    };

    RenderedEntry {
        sender: message.sender,
        classes,
        meta: format!("{} • {}", label, format_time_in(message.timestamp, tz)),
        text: message.text.clone(),
        table: message.csv_attachment.as_ref().map(|csv| table_preview(csv, ui)),
        image: message
            .image_attachment
            .as_ref()
            .map(|image| image_preview(image, ui)),
        is_placeholder: false,
    }
}

fn table_preview(csv: &CsvAttachment, ui: &UiText) -> TablePreview {
    TablePreview {
        headers: csv.headers.clone(),
        rows: csv.rows.clone(),
        link: DownloadLink::new(&csv.download_url, &ui.csv_link_label),
    }
}

fn image_preview(image: &ImageAttachment, ui: &UiText) -> ImagePreview {
    ImagePreview {
        src: image.inline_image.as_data_url().to_string(),
        alt: ui.image_alt.clone(),
        link: DownloadLink::new(&image.download_url, &ui.image_link_label),
    }
}

/// `HH:MM` in local time
pub fn format_time(timestamp_ms: i64) -> String {
    format_time_in(timestamp_ms, &Local)
}

fn format_time_in<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(utc) => utc.with_timezone(tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InlineImage;

    #[test]
    fn test_empty_log_renders_one_placeholder() {
        let entries = render_log(&[], &UiText::default());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_placeholder);
        assert_eq!(entries[0].sender, Sender::Bot);
        assert_eq!(entries[0].text, UiText::default().placeholder_greeting);
    }

    #[test]
    fn test_one_entry_per_message() {
        let messages = vec![Message::user("a"), Message::bot("b")];
        let entries = render_log(&messages, &UiText::default());
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_placeholder));
    }

    #[test]
    fn test_error_class_and_meta() {
        let mut message = Message::bot_error("nope");
        message.timestamp = 1_700_000_000_000; // 22:13:20 UTC
        let entry = render_message_in(&message, &UiText::default(), &Utc);

        assert_eq!(entry.classes, vec!["message", "message--bot", "message--error"]);
        assert_eq!(entry.meta, "Bot • 22:13");
    }

    #[test]
    fn test_attachments_rendered() {
        let message = Message::bot("report")
            .with_csv(Some(CsvAttachment {
                headers: vec!["h".into()],
                rows: vec![vec!["v".into()]],
                download_url: "https://x.test/files/a.csv".into(),
            }))
            .with_image(Some(ImageAttachment {
                download_url: "https://x.test/api/download/png".into(),
                inline_image: InlineImage::from_base64("image/png", "AAAA"),
            }));

        let entry = render_message(&message, &UiText::default());
        let table = entry.table.unwrap();
        assert_eq!(table.link.href, "https://x.test/files/a.csv");
        assert_eq!(table.link.rel, "noopener noreferrer");

        let image = entry.image.unwrap();
        assert_eq!(image.src, "data:image/png;base64,AAAA");
        assert_eq!(image.link.label, "Download image");
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert_eq!(format_time_in(i64::MAX, &Utc), "--:--");
    }
}
