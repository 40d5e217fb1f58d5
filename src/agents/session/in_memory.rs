//! In-memory session store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{ConversationHistory, SessionCreation, SessionStore};
use crate::agents::domain::{Message, SessionKey};
use crate::agents::error::{SessionStoreError, SessionStoreResult};

/// Snapshot of one stored session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub key: SessionKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<Message>,
}

impl SessionRecord {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }
}

/// In-memory session store, lost on restart
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, SessionRecord>>>,
    max_history_messages: usize,
    max_sessions: Option<usize>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(100, None)
    }
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new(max_history_messages: usize, max_sessions: Option<usize>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_history_messages,
            max_sessions,
        }
    }

    /// Snapshot of a session, if it exists
    pub async fn get(&self, key: &SessionKey) -> Option<SessionRecord> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn check_capacity(&self, current: usize) -> SessionStoreResult<()> {
        match self.max_sessions {
            Some(max) if current >= max => Err(SessionStoreError::CapacityExceeded(max)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_if_absent(&self, key: &SessionKey) -> SessionStoreResult<SessionCreation> {
        // Fast path: most turns reference an existing session
        if self.sessions.read().await.contains_key(key) {
            return Ok(SessionCreation::AlreadyExists);
        }

        let mut sessions = self.sessions.write().await;
        let current = sessions.len();
        match sessions.entry(key.clone()) {
            Entry::Occupied(_) => Ok(SessionCreation::AlreadyExists),
            Entry::Vacant(slot) => {
                self.check_capacity(current)?;
                slot.insert(SessionRecord::new(key.clone()));
                Ok(SessionCreation::Created)
            }
        }
    }
}

#[async_trait]
impl ConversationHistory for InMemorySessionStore {
    async fn history(&self, key: &SessionKey) -> SessionStoreResult<Vec<Message>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).map(|s| s.history.clone()).unwrap_or_default())
    }

    async fn append_history(&self, key: &SessionKey, messages: Vec<Message>) -> SessionStoreResult<()> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.len();
        let session = match sessions.entry(key.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                self.check_capacity(current)?;
                slot.insert(SessionRecord::new(key.clone()))
            }
        };

        session.history.extend(messages);
        session.updated_at = Utc::now();

        // Trim if exceeds max messages
        if session.history.len() > self.max_history_messages {
            let remove_count = session.history.len() - self.max_history_messages;
            session.history.drain(0..remove_count);
        }

        Ok(())
    }
}
