use super::common;

use buying_assistant::agents::config::RemoteRuntimeConfig;
use buying_assistant::agents::orchestrator::{OrchestratorOptions, SessionOrchestrator, TurnOutcome};
use buying_assistant::agents::runtime::RemoteAgentRuntime;
use buying_assistant::agents::session::{RemoteSessionStore, SessionCreation, SessionStore};
use buying_assistant::agents::domain::SessionKey;
use common::fake_agent_server::FakeAgentServer;
use std::sync::Arc;

fn remote_config(server: &FakeAgentServer) -> RemoteRuntimeConfig {
    RemoteRuntimeConfig {
        base_url: server.base_url.clone(),
        timeout_seconds: 10,
        streaming: true,
    }
}

fn orchestrator(server: &FakeAgentServer) -> SessionOrchestrator {
    let config = remote_config(server);
    SessionOrchestrator::new(
        Arc::new(RemoteSessionStore::new(&config).unwrap()),
        Arc::new(RemoteAgentRuntime::new(&config).unwrap()),
        OrchestratorOptions::default(),
    )
}

#[tokio::test]
async fn test_remote_store_create_if_absent() {
    let server = FakeAgentServer::start().await;
    let store = RemoteSessionStore::new(&remote_config(&server)).unwrap();
    let key = SessionKey::new("buying_assistant", "default_user", "abc");

    assert_eq!(store.create_if_absent(&key).await.unwrap(), SessionCreation::Created);
    assert_eq!(
        store.create_if_absent(&key).await.unwrap(),
        SessionCreation::AlreadyExists
    );
}

#[tokio::test]
async fn test_remote_turn_aggregates_streamed_events() {
    let server = FakeAgentServer::start().await;
    let orchestrator = orchestrator(&server);

    let reply = orchestrator
        .handle_turn("Best laptop under 1000", &["HDFC Regalia".to_string()], None)
        .await;

    assert_eq!(reply.outcome, TurnOutcome::Answered);
    assert_eq!(reply.text, "Recommend X because Y");

    let runs = server.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["app_name"], "buying_assistant");
    assert_eq!(runs[0]["user_id"], "default_user");
    assert_eq!(runs[0]["session_id"], reply.session_id.as_str());
    assert_eq!(runs[0]["streaming"], true);
    assert_eq!(runs[0]["new_message"]["role"], "user");
    assert_eq!(
        runs[0]["new_message"]["parts"][0]["text"],
        "Best laptop under 1000\nUser Context (Cards): HDFC Regalia"
    );
}

#[tokio::test]
async fn test_existing_remote_session_is_not_an_error() {
    let server = FakeAgentServer::start().await;
    let orchestrator = orchestrator(&server);

    let first = orchestrator.handle_turn("one", &[], Some("shared".to_string())).await;
    let second = orchestrator.handle_turn("two", &[], Some("shared".to_string())).await;

    assert_eq!(first.outcome, TurnOutcome::Answered);
    assert_eq!(second.outcome, TurnOutcome::Answered);
    assert_eq!(
        server.session_posts(),
        vec![
            "buying_assistant/default_user/shared".to_string(),
            "buying_assistant/default_user/shared".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_error_event_becomes_error_reply() {
    let server = FakeAgentServer::start().await;
    let orchestrator = orchestrator(&server);

    let reply = orchestrator.handle_turn("QUOTA", &[], Some("q".to_string())).await;

    assert_eq!(reply.outcome, TurnOutcome::Failed);
    assert_eq!(
        reply.text,
        "Error communicating with agent: Runtime error: 429 RESOURCE_EXHAUSTED"
    );
    assert_eq!(reply.session_id, "q");
}

#[tokio::test]
async fn test_rejected_submission_becomes_error_reply() {
    let server = FakeAgentServer::start().await;
    let orchestrator = orchestrator(&server);

    let reply = orchestrator.handle_turn("REJECT me", &[], None).await;

    assert_eq!(reply.outcome, TurnOutcome::Failed);
    assert!(reply.text.contains("422"));
    assert!(!reply.session_id.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_becomes_error_reply() {
    // Nothing listens on the discard port
    let config = RemoteRuntimeConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        streaming: false,
    };
    let orchestrator = SessionOrchestrator::new(
        Arc::new(RemoteSessionStore::new(&config).unwrap()),
        Arc::new(RemoteAgentRuntime::new(&config).unwrap()),
        OrchestratorOptions::default(),
    );

    let reply = orchestrator.handle_turn("hello", &[], None).await;

    assert_eq!(reply.outcome, TurnOutcome::Failed);
    assert!(reply.text.starts_with("Error communicating with agent: "));
}
