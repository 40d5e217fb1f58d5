//! Session orchestration: the entry point for one conversational turn
//!
//! A turn resolves its session id, makes sure the session exists, submits the
//! message to the agent runtime and aggregates the resulting event stream
//! into a single reply. [`SessionOrchestrator::handle_turn`] never fails:
//! every fault is rendered into the reply text.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::aggregate::aggregate;
use crate::agents::domain::{AgentRuntime, Content, SessionKey};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::session::SessionStore;

/// The text submitted for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    text: String,
}

impl TurnRequest {
    /// Build the turn text, appending the rendered annotations when there
    /// are any
    pub fn new(message: &str, label: &str, annotations: &[String]) -> Self {
        let mut text = message.to_string();
        if !annotations.is_empty() {
            text.push_str(&format!("\nUser Context ({}): {}", label, annotations.join(", ")));
        }
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_content(self) -> Content {
        Content::user_text(self.text)
    }
}

/// Fixed identity and reply texts used by the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub app_name: String,
    pub user_id: String,
    /// Label rendered in front of the context annotations
    pub context_label: String,
    pub fallback_reply: String,
    pub error_prefix: String,
    /// Upper bound on submit + aggregate; unbounded when `None`
    pub turn_timeout: Option<Duration>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            app_name: "buying_assistant".to_string(),
            user_id: "default_user".to_string(),
            context_label: "Cards".to_string(),
            fallback_reply: "No response generated".to_string(),
            error_prefix: "Error communicating with agent".to_string(),
            turn_timeout: None,
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The runtime produced reply text
    Answered,
    /// The stream completed without any fragment; the fallback was used
    Empty,
    /// The turn failed; the reply describes the error
    Failed,
}

/// Result of one turn: always carries a reply and a usable session id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    pub session_id: String,
    pub outcome: TurnOutcome,
}

/// Drives turns through the session store and the agent runtime
pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    runtime: Arc<dyn AgentRuntime>,
    options: OrchestratorOptions,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        runtime: Arc<dyn AgentRuntime>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            store,
            runtime,
            options,
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Handle one user turn
    pub async fn handle_turn(
        &self,
        message: &str,
        annotations: &[String],
        session_id: Option<String>,
    ) -> TurnReply {
        let session_id = resolve_session_id(session_id);
        let key = SessionKey::new(&self.options.app_name, &self.options.user_id, session_id);
        let request = TurnRequest::new(message, &self.options.context_label, annotations);

        self.store.ensure(&key).await;

        match self.run_turn(&key, request).await {
            Ok(text) if text.is_empty() => {
                warn!(session_id = %key.session_id, runtime = self.runtime.name(), "Turn produced no text");
                self.reply(key, self.options.fallback_reply.clone(), TurnOutcome::Empty)
            }
            Ok(text) => {
                info!(session_id = %key.session_id, chars = text.len(), "Turn answered");
                self.reply(key, text, TurnOutcome::Answered)
            }
            Err(e) => {
                error!(session_id = %key.session_id, runtime = self.runtime.name(), error = %e, "Turn failed");
                let text = format!("{}: {}", self.options.error_prefix, e);
                self.reply(key, text, TurnOutcome::Failed)
            }
        }
    }

    async fn run_turn(&self, key: &SessionKey, request: TurnRequest) -> AgentResult<String> {
        let turn = async {
            let stream = self.runtime.submit_turn(key, request.into_content()).await?;
            aggregate(stream).await
        };

        match self.options.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, turn)
                .await
                .map_err(|_| AgentError::Timeout(limit.as_secs()))?,
            None => turn.await,
        }
    }

    fn reply(&self, key: SessionKey, text: String, outcome: TurnOutcome) -> TurnReply {
        TurnReply {
            text,
            session_id: key.session_id,
            outcome,
        }
    }
}

/// Use the caller's id verbatim, or mint a fresh one when none (or an empty
/// one) was supplied
fn resolve_session_id(session_id: Option<String>) -> String {
    session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
