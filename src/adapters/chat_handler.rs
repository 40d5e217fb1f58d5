//! `POST /api/chat`: one conversational turn per request
//!
//! The handler always answers 200 with a `{response, session_id}` envelope;
//! failures are already rendered into `response` by the orchestrator.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::orchestrator::SessionOrchestrator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Names of the user's payment cards, passed to the agent as context
    #[serde(default)]
    pub cards: Option<Vec<String>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

/// POST /api/chat - Run one turn of the conversation
pub async fn chat(
    State(orchestrator): State<Arc<SessionOrchestrator>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let cards = request.cards.unwrap_or_default();
    let reply = orchestrator
        .handle_turn(&request.message, &cards, request.session_id)
        .await;

    Json(ChatResponse {
        response: reply.text,
        session_id: reply.session_id,
    })
}
