//! Session resolution for remote calls.

use std::sync::{Mutex, PoisonError};

use filedock_protocol::SessionId;

/// Supplies the session used for remote calls.
///
/// `None` means nobody is logged in. Metadata lookups then fall back to the
/// anonymous session; every other operation fails with
/// [`ClientError::NotAuthenticated`](crate::ClientError::NotAuthenticated).
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> Option<SessionId>;
}

/// Session holder updated by the application on login and logout.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Mutex<Option<SessionId>>,
}

impl SessionSlot {
    /// An empty slot (anonymous).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(session: SessionId) -> Self {
        Self {
            current: Mutex::new(Some(session)),
        }
    }

    pub fn set(&self, session: SessionId) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SessionProvider for SessionSlot {
    fn session(&self) -> Option<SessionId> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
