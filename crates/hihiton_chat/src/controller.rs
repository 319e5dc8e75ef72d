//! Request lifecycle.
//!
//! ```text
//!            submit (accepted)              reply / failure
//!   Idle ─────────────────────────▶ Sending ─────────────────▶ Idle
//!    ▲                                                        (status Ready | Error)
//!    └── submit rejected (empty text, or already Sending)
//! ```
//!
//! The controller is the only component that talks to the chat API. At most
//! one request is in flight per session; the Sending state is left through a
//! single guard whose drop re-enables input on every exit path.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::attachments::{AttachmentResolver, ResolvedReply};
use crate::config::UiText;
use crate::error::{ChatError, ChatResult};
use crate::events::{ChatEvent, InputState, StatusIndicator};
use crate::session::SessionIdentity;
use crate::store::MessageStore;
use crate::transport::{ChatTransport, TransportResponse};
use crate::types::{ChatReply, ChatRequest, Message};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Sending,
}

/// Why a submit was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing left after trimming
    Empty,
    /// A request is already in flight
    Busy,
}

/// Result of `submit`
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// The request ran to completion; carries the appended bot message
    Completed(Message),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn reply(&self) -> Option<&Message> {
        match self {
            Self::Completed(message) => Some(message),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Status {
    state: ControllerState,
    indicator: StatusIndicator,
    input: InputState,
}

/// Drives send/receive for one session
pub struct RequestController {
    session: SessionIdentity,
    store: Arc<MessageStore>,
    resolver: AttachmentResolver,
    transport: Arc<dyn ChatTransport>,
    ui: UiText,
    status: Mutex<Status>,
}

impl RequestController {
    pub fn new(
        session: SessionIdentity,
        store: Arc<MessageStore>,
        resolver: AttachmentResolver,
        transport: Arc<dyn ChatTransport>,
        ui: UiText,
    ) -> Self {
        Self {
            session,
            store,
            resolver,
            transport,
            ui,
            status: Mutex::new(Status {
                state: ControllerState::Idle,
                indicator: StatusIndicator::Ready,
                input: InputState::default(),
            }),
        }
    }

    /// Send `text` and wait for the reply.
    ///
    /// Ignored when `text` is blank or another request is in flight.
    /// Failures never escape: they become an error-flagged bot message.
    /// Dropping the future mid-flight records a cancellation error message
    /// and leaves the status at Error.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }

        let Some(_guard) = self.begin_sending() else {
            debug!("Request already in flight, ignoring submit");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        };

        self.store.append(Message::user(text));
        self.store
            .notify(&ChatEvent::StatusChanged(StatusIndicator::Busy));
        self.store.notify(&ChatEvent::InputChanged(self.input()));

        let (reply, indicator) = match self.exchange(text).await {
            Ok(resolved) => (
                Message::bot(resolved.text)
                    .with_csv(resolved.csv)
                    .with_image(resolved.image),
                StatusIndicator::Ready,
            ),
            Err(e) => {
                warn!("Chat request failed: {}", e);
                (
                    Message::bot_error(format!("{}{}", self.ui.error_prefix, e)),
                    StatusIndicator::Error,
                )
            }
        };

        let stored = self.store.append(reply);
        self.set_indicator(indicator);
        SubmitOutcome::Completed(stored)
    }

    /// Claim the Sending state, or `None` if it is already taken
    fn begin_sending(&self) -> Option<SendingGuard<'_>> {
        let mut status = self.status.lock();
        if status.state == ControllerState::Sending {
            return None;
        }
        status.state = ControllerState::Sending;
        status.indicator = StatusIndicator::Busy;
        status.input = InputState {
            enabled: false,
            focused: false,
        };
        Some(SendingGuard { controller: self })
    }

    async fn exchange(&self, text: &str) -> ChatResult<ResolvedReply> {
        let request = ChatRequest {
            message: text.to_string(),
            session_id: self.session.id().to_string(),
        };

        let response = self.transport.post_chat(&request).await?;
        if !response.is_success() {
            return Err(ChatError::Transport(self.error_detail(&response)));
        }

        let reply: ChatReply = serde_json::from_str(&response.body)
            .map_err(|e| ChatError::Payload(format!("Invalid response body: {}", e)))?;
        info!(
            "Reply received (csv: {}, png: {})",
            reply.csv.is_some(),
            reply.png.is_some()
        );
        Ok(self.resolver.resolve_reply(reply))
    }

    /// Human-readable reason for a non-success response
    fn error_detail(&self, response: &TransportResponse) -> String {
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(payload) => match payload.get("detail") {
                Some(serde_json::Value::String(detail)) => detail.clone(),
                Some(serde_json::Value::Null) | None => self.ui.unknown_error.clone(),
                Some(other) => other.to_string(),
            },
            Err(_) if response.status_text.is_empty() => format!("HTTP {}", response.status),
            Err(_) => response.status_text.clone(),
        }
    }

    fn set_indicator(&self, indicator: StatusIndicator) {
        self.status.lock().indicator = indicator;
        self.store.notify(&ChatEvent::StatusChanged(indicator));
    }

    pub fn state(&self) -> ControllerState {
        self.status.lock().state
    }

    pub fn status(&self) -> StatusIndicator {
        self.status.lock().indicator
    }

    /// Label for the current status badge
    pub fn status_text(&self) -> &str {
        match self.status() {
            StatusIndicator::Ready => &self.ui.status_ready,
            StatusIndicator::Busy => &self.ui.status_busy,
            StatusIndicator::Error => &self.ui.status_error,
        }
    }

    pub fn input(&self) -> InputState {
        self.status.lock().input
    }

    pub fn session(&self) -> &SessionIdentity {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.messages()
    }

    pub fn resolver(&self) -> &AttachmentResolver {
        &self.resolver
    }

    pub fn transport(&self) -> &Arc<dyn ChatTransport> {
        &self.transport
    }

    pub fn ui(&self) -> &UiText {
        &self.ui
    }
}

/// Held for the whole Sending state; dropping it returns to Idle.
struct SendingGuard<'a> {
    controller: &'a RequestController,
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        let (input, abandoned) = {
            let mut status = self.controller.status.lock();
            status.state = ControllerState::Idle;
            status.input = InputState {
                enabled: true,
                focused: true,
            };
            let abandoned = status.indicator == StatusIndicator::Busy;
            if abandoned {
                status.indicator = StatusIndicator::Error;
            }
            (status.input, abandoned)
        };

        if abandoned {
            warn!("Request abandoned before a reply was recorded");
            let ui = &self.controller.ui;
            self.controller.store.append(Message::bot_error(format!(
                "{}{}",
                ui.error_prefix, ui.request_cancelled
            )));
            self.controller
                .store
                .notify(&ChatEvent::StatusChanged(StatusIndicator::Error));
        }
        self.controller.store.notify(&ChatEvent::InputChanged(input));
    }
}
