//! Domain types for the agent layer
//!
//! Core abstractions shared by the session store, the agent runtimes and the
//! orchestrator.

mod content;
mod event;
mod message;
mod stream;

pub use content::*;
pub use event::*;
pub use message::*;
pub use stream::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::error::AgentResult;

/// Identity of a conversation: (application, user, session)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// Port trait for the generative agent runtime a turn is submitted to
///
/// The runtime owns conversational history. A successful submission hands
/// back a finite stream of events that ends when the runtime considers the
/// turn complete; failures after submission arrive as `Err` items.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Submit one user turn for the given session
    async fn submit_turn(&self, key: &SessionKey, content: Content) -> AgentResult<EventStream>;
}
