//! Persisted, append-only message log.
//!
//! [`MessageLog`] is the pure value: appending produces the next log.
//! [`MessageStore`] owns the current log, writes a full JSON snapshot to
//! the storage medium after every append, and notifies observers.
//!
//! Several sessions sharing one storage scope overwrite each other's
//! snapshot; the last writer wins.

use std::collections::HashSet;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};
use crate::events::{ChatEvent, EventHandler, Observers, SubscriptionId};
use crate::storage::SharedStorage;
use crate::types::{new_id, Message};

/// Ordered conversation log with unique message ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageLog {
    messages: Vec<Message>,
    ids: HashSet<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from a deserialized snapshot, dropping repeated ids
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut log = Self::new();
        for message in messages {
            if log.contains_id(&message.id) {
                warn!("Dropping duplicate message {} from snapshot", message.id);
                continue;
            }
            log.ids.insert(message.id.clone());
            log.messages.push(message);
        }
        log
    }

    /// Return the log with `message` at the tail.
    ///
    /// A message whose id is already present gets a freshly minted id.
    pub fn append(mut self, message: Message) -> Self {
        self.push(message);
        self
    }

    fn push(&mut self, mut message: Message) -> &Message {
        if self.contains_id(&message.id) {
            let fresh = new_id();
            warn!("Message id {} already in log, re-minted as {}", message.id, fresh);
            message.id = fresh;
        }
        self.ids.insert(message.id.clone());
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn to_snapshot(&self) -> ChatResult<String> {
        Ok(serde_json::to_string(&self.messages)?)
    }

    fn from_snapshot(raw: &str) -> ChatResult<Self> {
        let messages: Vec<Message> = serde_json::from_str(raw)?;
        Ok(Self::from_messages(messages))
    }
}

/// The session's message log, mirrored to storage
pub struct MessageStore {
    storage: Option<SharedStorage>,
    key: String,
    log: RwLock<MessageLog>,
    observers: Observers,
}

impl MessageStore {
    /// A store with no persistence
    pub fn in_memory() -> Self {
        Self {
            storage: None,
            key: String::new(),
            log: RwLock::new(MessageLog::new()),
            observers: Observers::new(),
        }
    }

    /// Hydrate from the snapshot under `key`.
    ///
    /// Absent, unreadable or malformed snapshots yield an empty store.
    pub fn load(storage: Option<SharedStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let log = match &storage {
            Some(medium) => match Self::read_snapshot(medium, &key) {
                Ok(log) => log,
                Err(e) => {
                    warn!("Discarding stored conversation: {}", e);
                    MessageLog::new()
                }
            },
            None => MessageLog::new(),
        };
        debug!("Loaded {} message(s) from storage", log.len());

        Self {
            storage,
            key,
            log: RwLock::new(log),
            observers: Observers::new(),
        }
    }

    fn read_snapshot(storage: &SharedStorage, key: &str) -> ChatResult<MessageLog> {
        match storage.get_item(key)? {
            Some(raw) if !raw.trim().is_empty() => MessageLog::from_snapshot(&raw)
                .map_err(|e| ChatError::Persistence(format!("corrupt snapshot: {}", e))),
            _ => Ok(MessageLog::new()),
        }
    }

    /// Add `message` at the tail, persist the snapshot, and notify observers.
    ///
    /// Returns the message as stored (its id may have been re-minted).
    /// Persistence failures are logged; the in-memory log stays authoritative.
    pub fn append(&self, message: Message) -> Message {
        let (stored, snapshot) = {
            let mut log = self.log.write();
            let stored = log.push(message).clone();
            (stored, log.to_snapshot())
        };

        self.persist(snapshot);
        self.observers
            .notify(&ChatEvent::MessageAppended(stored.clone()));
        stored
    }

    fn persist(&self, snapshot: ChatResult<String>) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = snapshot.and_then(|raw| storage.set_item(&self.key, &raw));
        if let Err(e) = result {
            warn!("Could not persist conversation snapshot: {}", e);
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.log.read().messages().to_vec()
    }

    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    pub fn subscribe(&self, handler: EventHandler) -> SubscriptionId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Forward a non-log event (status, input) to the same observers
    pub(crate) fn notify(&self, event: &ChatEvent) {
        self.observers.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::storage::{KeyValueStorage, MemoryStorage, MockKeyValueStorage};
    use crate::types::Sender;

    const KEY: &str = "hihiton-web-messages";

    fn memory() -> (MemoryStorage, Option<SharedStorage>) {
        let storage = MemoryStorage::new();
        let shared: SharedStorage = Arc::new(storage.clone());
        (storage, Some(shared))
    }

    #[test]
    fn test_log_append_is_pure() {
        let empty = MessageLog::new();
        let one = empty.clone().append(Message::user("a"));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_log_remints_duplicate_id() {
        let first = Message::user("a");
        let mut dup = Message::bot("b");
        dup.id = first.id.clone();

        let log = MessageLog::new().append(first.clone()).append(dup);
        assert_eq!(log.len(), 2);
        assert_ne!(log.messages()[0].id, log.messages()[1].id);
        assert_eq!(log.messages()[0].id, first.id);
    }

    #[test]
    fn test_roundtrip_through_storage() {
        let (_, shared) = memory();
        let store = MessageStore::load(shared.clone(), KEY);
        let sent: Vec<Message> = vec![
            store.append(Message::user("one")),
            store.append(Message::bot("two")),
            store.append(Message::bot_error("three")),
        ];

        let reloaded = MessageStore::load(shared, KEY);
        assert_eq!(reloaded.messages(), sent);
    }

    #[test]
    fn test_corrupt_snapshot_loads_empty() {
        let (raw, shared) = memory();
        raw.set_item(KEY, "{not json").unwrap();

        let store = MessageStore::load(shared, KEY);
        assert!(store.is_empty());
    }

    #[test]
    fn test_wrong_shape_snapshot_loads_empty() {
        let (raw, shared) = memory();
        raw.set_item(KEY, r#"{"messages": []}"#).unwrap();

        assert!(MessageStore::load(shared, KEY).is_empty());
    }

    #[test]
    fn test_snapshot_from_browser_client() {
        let (raw, shared) = memory();
        raw.set_item(
            KEY,
            r#"[{"id":"u1","sender":"user","text":"hello","timestamp":1},
                {"id":"b1","sender":"bot","text":"","csv":{"headers":["a"],"rows":[["1"]],"downloadUrl":"https://x.test/api/download/csv"},"png":null,"timestamp":2}]"#,
        )
        .unwrap();

        let store = MessageStore::load(shared, KEY);
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].csv_attachment.as_ref().unwrap().headers, vec!["a"]);
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let mut mock = MockKeyValueStorage::new();
        mock.expect_get_item().returning(|_| Ok(None));
        mock.expect_set_item()
            .returning(|_, _| Err(ChatError::Persistence("quota exceeded".into())));
        let shared: SharedStorage = Arc::new(mock);

        let store = MessageStore::load(Some(shared), KEY);
        store.append(Message::user("still here"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_read_failure_loads_empty() {
        let mut mock = MockKeyValueStorage::new();
        mock.expect_get_item()
            .returning(|_| Err(ChatError::Persistence("denied".into())));
        let shared: SharedStorage = Arc::new(mock);

        assert!(MessageStore::load(Some(shared), KEY).is_empty());
    }

    #[test]
    fn test_append_notifies_observers() {
        let store = MessageStore::in_memory();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(move |event| {
            if let ChatEvent::MessageAppended(m) = event {
                sink.lock().push(m.text.clone());
            }
        }));

        store.append(Message::user("hi"));
        assert_eq!(*seen.lock(), vec!["hi".to_string()]);
        assert!(!store.is_persistent());
    }
}
