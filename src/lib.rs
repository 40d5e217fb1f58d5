//! # Buying Assistant
//!
//! An HTTP chat gateway in front of a generative agent. Each `POST /api/chat`
//! turn is routed to an agent runtime whose event stream is folded into a
//! single reply; a session id ties turns into one conversation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use buying_assistant::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(std::path::Path::new("buying-assistant.toml"))?;
//!     let orchestrator = buying_assistant::build_orchestrator(&settings)?;
//!     let app = buying_assistant::create_app(orchestrator, settings.server.static_dir.as_deref());
//!     # let _ = app;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Agents**: session store, event extraction, turn aggregation, runtimes
//! - **Adapters**: HTTP handlers
//! - **Config**: Configuration management

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;

use crate::adapters::chat_handler;
use crate::adapters::health_handler::HealthHandler;
use crate::agents::config::RuntimeKind;
use crate::agents::llm::create_provider;
use crate::agents::orchestrator::SessionOrchestrator;
use crate::agents::runtime::{LlmAgentRuntime, RemoteAgentRuntime};
use crate::agents::session::{InMemorySessionStore, RemoteSessionStore};
use crate::config::Settings;
use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};

/// Creates the Axum application router with all endpoints configured.
///
/// Paths outside `/health` and `/api` are served from `static_dir` when one
/// is given.
pub fn create_app(orchestrator: Arc<SessionOrchestrator>, static_dir: Option<&Path>) -> Router {
    let health_handler = Arc::new(HealthHandler::new());

    let public_router = Router::new()
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }));

    let api_router = Router::new()
        .route("/chat", post(chat_handler::chat))
        .with_state(orchestrator);

    let mut router = public_router.nest("/api", api_router);

    if let Some(dir) = static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router.layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}

/// Wire the session store and agent runtime selected by the settings
pub fn build_orchestrator(settings: &Settings) -> anyhow::Result<Arc<SessionOrchestrator>> {
    let agent = &settings.agent;

    let orchestrator = match agent.runtime {
        RuntimeKind::Gemini => {
            let store = Arc::new(InMemorySessionStore::new(
                settings.sessions.max_history_messages,
                settings.sessions.max_sessions,
            ));
            let llm = create_provider(&agent.llm).context("Failed to create Gemini provider")?;
            tracing::info!(model = llm.model(), "Using in-process Gemini runtime");

            let runtime = LlmAgentRuntime::new(&agent.app_name, llm, store.clone(), &agent.llm)
                .with_system_prompt(agent.system_prompt());
            SessionOrchestrator::new(store, Arc::new(runtime), agent.orchestrator_options())
        }
        RuntimeKind::Remote => {
            let remote = agent
                .remote
                .as_ref()
                .context("agent.remote must be configured for the remote runtime")?;
            tracing::info!(url = %remote.base_url, "Using remote agent runtime");

            let store = RemoteSessionStore::new(remote).context("Invalid remote session store")?;
            let runtime = RemoteAgentRuntime::new(remote).context("Invalid remote agent runtime")?;
            SessionOrchestrator::new(Arc::new(store), Arc::new(runtime), agent.orchestrator_options())
        }
    };

    Ok(Arc::new(orchestrator))
}
