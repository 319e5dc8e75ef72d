//! Change notification between the chat core and its presentation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::Message;

/// Status badge shown next to the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Ready,
    Busy,
    Error,
}

impl StatusIndicator {
    /// CSS-style modifier (`status-badge--busy`, `status-badge--error`)
    pub fn modifier(&self) -> Option<&'static str> {
        match self {
            Self::Ready => None,
            Self::Busy => Some("busy"),
            Self::Error => Some("error"),
        }
    }
}

/// Whether the input box accepts text and holds focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    pub enabled: bool,
    pub focused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            enabled: true,
            focused: true,
        }
    }
}

/// Something observers may want to repaint
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    MessageAppended(Message),
    StatusChanged(StatusIndicator),
    InputChanged(InputState),
}

/// Observer callback type.
pub type EventHandler = Arc<dyn Fn(&ChatEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of observers
#[derive(Default)]
pub struct Observers {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionId, EventHandler)>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(sid, _)| *sid != id);
        handlers.len() != before
    }

    pub fn notify(&self, event: &ChatEvent) {
        // Handlers run without the lock held so they may read state or subscribe
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}
