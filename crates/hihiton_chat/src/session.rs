//! Session identity.
//!
//! One opaque identifier per storage scope, minted on first use and reused
//! across reloads. Without a working medium a fresh id is minted on every
//! load.

use tracing::{debug, warn};

use crate::storage::KeyValueStorage;
use crate::types::{new_id, SessionId};

/// The resolved identity of this chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    id: SessionId,
    ephemeral: bool,
}

impl SessionIdentity {
    /// Return the persisted identifier, or mint and persist a new one.
    ///
    /// Never fails: storage errors degrade to an ephemeral identifier. A
    /// failed read leaves the stored value untouched.
    pub fn get_or_create(storage: Option<&dyn KeyValueStorage>, key: &str) -> Self {
        let Some(storage) = storage else {
            let id = new_id();
            debug!("No storage medium, using ephemeral session {}", id);
            return Self {
                id,
                ephemeral: true,
            };
        };

        match storage.get_item(key) {
            Ok(Some(existing)) if !existing.trim().is_empty() => {
                debug!("Resumed session {}", existing);
                return Self {
                    id: existing,
                    ephemeral: false,
                };
            }
            Ok(_) => {}
            Err(e) => {
                // A stored id may still be there; never overwrite it blind
                let id = new_id();
                warn!("Could not read session id, using ephemeral session {}: {}", id, e);
                return Self {
                    id,
                    ephemeral: true,
                };
            }
        }

        let id = new_id();
        let ephemeral = match storage.set_item(key, &id) {
            Ok(()) => false,
            Err(e) => {
                warn!("Could not persist session id, session is ephemeral: {}", e);
                true
            }
        };
        debug!("Created session {}", id);

        Self { id, ephemeral }
    }

    /// An identity that is never persisted
    pub fn ephemeral() -> Self {
        Self::get_or_create(None, "")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the id will not survive a reload
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
