//! Session stores
//!
//! Provides backends that track which conversations exist:
//! - In-memory (default, lost on restart); also holds the history used by
//!   the in-process runtime
//! - Remote (the session endpoint of an ADK-compatible agent server)

mod in_memory;
mod remote;

pub use in_memory::{InMemorySessionStore, SessionRecord};
pub use remote::RemoteSessionStore;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agents::domain::{Message, SessionKey};
use crate::agents::error::SessionStoreResult;

/// Result of a create-if-absent call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCreation {
    Created,
    AlreadyExists,
}

/// Trait for session storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create the session record unless one already exists for the key
    ///
    /// Concurrent calls for one key create at most one record.
    async fn create_if_absent(&self, key: &SessionKey) -> SessionStoreResult<SessionCreation>;

    /// Make sure the session exists
    ///
    /// An existing session is not an error. Any other failure is logged and
    /// swallowed: runtimes materialize missing sessions on their own.
    async fn ensure(&self, key: &SessionKey) {
        match self.create_if_absent(key).await {
            Ok(SessionCreation::Created) => {
                debug!(session_id = %key.session_id, "Session created");
            }
            Ok(SessionCreation::AlreadyExists) => {
                debug!(session_id = %key.session_id, "Session already exists");
            }
            Err(e) => {
                warn!(session_id = %key.session_id, error = %e, "Failed to ensure session, continuing");
            }
        }
    }
}

/// Conversation history owned by an in-process runtime
#[async_trait]
pub trait ConversationHistory: Send + Sync {
    /// Messages recorded so far for the session, oldest first
    async fn history(&self, key: &SessionKey) -> SessionStoreResult<Vec<Message>>;

    /// Append messages, creating the session if it does not exist yet
    async fn append_history(&self, key: &SessionKey, messages: Vec<Message>) -> SessionStoreResult<()>;
}
