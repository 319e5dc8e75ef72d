//! CLI command definitions.
//!
//! The CLI is a terminal host for the chat client: it paints the message log
//! as text instead of page nodes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use hihiton_chat::{ChatApp, ClientConfig, FileStorage, MemoryStorage, RenderedEntry, SharedStorage};

pub mod chat;
pub mod download;
pub mod history;
pub mod send;
pub mod session;

/// Hihiton - data questions answered with tables and charts
#[derive(Parser)]
#[command(name = "hihiton")]
#[command(version, about = "Hihiton - chat with the data assistant")]
#[command(long_about = r#"
Hihiton sends your questions to the Hihiton chat API and shows the replies,
including CSV previews and chart links.

COMMANDS:
  chat      → Interactive conversation (type /quit to leave)
  send      → Send one message and print the reply
  history   → Print the stored conversation
  download  → Save an attachment link to a file
  session   → Print the session id

Without --state-dir the conversation lives only as long as the process.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the chat API
    #[arg(long, global = true, env = "HIHITON_API_BASE_URL")]
    pub api_base: Option<String>,

    /// Directory holding the session scope (session id and message log)
    #[arg(long, global = true, env = "HIHITON_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Abort a request after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive conversation
    Chat,

    /// Send a single message
    Send(send::SendArgs),

    /// Print the stored conversation
    History,

    /// Save an attachment to a file
    Download(download::DownloadArgs),

    /// Print the session id
    Session,
}

impl ClientArgs {
    /// Settings file, then environment, then flags
    pub fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_settings(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()))?,
            None => ClientConfig::default(),
        }
        .apply_env();

        if let Some(base) = &self.api_base {
            config = config.with_api_base(base.clone());
        }
        if self.timeout.is_some() {
            config = config.with_request_timeout(self.timeout);
        }
        Ok(config)
    }

    pub fn storage(&self) -> Result<SharedStorage> {
        let storage: SharedStorage = match &self.state_dir {
            Some(dir) => Arc::new(
                FileStorage::open(dir)
                    .with_context(|| format!("Cannot open state dir {}", dir.display()))?,
            ),
            None => Arc::new(MemoryStorage::new()),
        };
        Ok(storage)
    }

    pub fn build_app(&self) -> Result<ChatApp> {
        let config = self.resolve_config()?;
        debug!("Using chat API at {}", config.api_base_url);
        let app = ChatApp::start_http(config, Some(self.storage()?))
            .context("Failed to start chat client")?;
        Ok(app)
    }
}

/// Terminal rendering of one entry
pub fn format_entry(entry: &RenderedEntry) -> String {
    let marker = if entry.classes.iter().any(|c| c == "message--error") {
        "⚠️ "
    } else {
        ""
    };

    let mut out = format!("[{}] {}{}", entry.meta, marker, entry.text);

    if let Some(table) = &entry.table {
        out.push_str(&format!("\n   {}", table.headers.join(" | ")));
        for row in &table.rows {
            out.push_str(&format!("\n   {}", row.join(" | ")));
        }
        out.push_str(&format!("\n   📎 {}: {}", table.link.label, table.link.href));
    }

    if let Some(image) = &entry.image {
        out.push_str(&format!("\n   🖼  {}: {}", image.link.label, image.link.href));
    }

    out
}

pub fn print_entries(entries: &[RenderedEntry]) {
    for entry in entries {
        println!("{}", format_entry(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hihiton_chat::{render_log, CsvAttachment, Message, UiText};

    #[test]
    fn test_format_entry_with_table() {
        let message = Message::bot("report").with_csv(Some(CsvAttachment {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into(), "2".into()]],
            download_url: "https://x.test/api/download/csv".into(),
        }));
        let entries = render_log(&[message], &UiText::default());
        let text = format_entry(&entries[0]);

        assert!(text.contains("report"));
        assert!(text.contains("a | b"));
        assert!(text.contains("1 | 2"));
        assert!(text.contains("https://x.test/api/download/csv"));
    }

    #[test]
    fn test_format_error_entry_is_marked() {
        let entries = render_log(&[Message::bot_error("failed")], &UiText::default());
        assert!(format_entry(&entries[0]).contains("⚠️"));
    }

    #[test]
    fn test_flags_override_settings() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"apiBaseUrl": "https://file.test"}"#).unwrap();

        let args = ClientArgs {
            api_base: Some("https://flag.test/".into()),
            state_dir: None,
            config: Some(path),
            timeout: Some(10),
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(config.api_base_url, "https://flag.test");
        assert_eq!(config.request_timeout_secs, Some(10));
    }
}
