//! # hihiton_chat - Chat client core for Hihiton
//!
//! This crate keeps a persisted log of one conversation, sends user text to
//! the Hihiton chat API, and records the replies, which may carry a CSV
//! table and/or a PNG chart.
//!
//! ## Key Features
//!
//! - **Session Identity**: one stable id per storage scope, ephemeral when storage is unavailable
//! - **Message Store**: append-only log, full snapshot persisted after every append
//! - **Single-flight Requests**: at most one request in flight, input always restored
//! - **Attachment Resolution**: links made absolute, inline images decoded, graceful fallback
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────────┐     ┌─────────────────┐
//! │  Host (page,    │────▶│  RequestController  │────▶│  ChatTransport  │──▶ POST /api/chat
//! │  terminal)      │     └──────────┬──────────┘     └─────────────────┘
//! └────────▲────────┘                │
//!          │          ┌──────────────┼──────────────┐
//!          │          ▼              ▼              ▼
//!          │  ┌───────────────┐ ┌──────────┐ ┌────────────────────┐
//!          └──│ MessageStore  │ │ Session  │ │ AttachmentResolver │
//!   events    └───────┬───────┘ └────┬─────┘ └────────────────────┘
//!                     ▼              ▼
//!             ┌─────────────────────────────┐
//!             │ KeyValueStorage (per scope) │
//!             └─────────────────────────────┘
//! ```

pub mod app;
pub mod attachments;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod mock;
pub mod render;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;
pub mod types;

pub use app::*;
pub use attachments::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use events::*;
pub use mock::*;
pub use render::*;
pub use session::*;
pub use storage::*;
pub use store::*;
pub use transport::*;
pub use types::*;
