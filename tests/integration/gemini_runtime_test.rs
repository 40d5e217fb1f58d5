use super::common;

use buying_assistant::agents::config::LlmProviderConfig;
use buying_assistant::agents::domain::{Role, SessionKey};
use buying_assistant::agents::llm::GeminiProvider;
use buying_assistant::agents::orchestrator::{OrchestratorOptions, SessionOrchestrator, TurnOutcome};
use buying_assistant::agents::runtime::LlmAgentRuntime;
use buying_assistant::agents::session::{ConversationHistory, InMemorySessionStore};
use common::fake_gemini_server::FakeGeminiServer;
use common::test_server::TestServer;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn setup(server: &FakeGeminiServer, stream: bool) -> (SessionOrchestrator, Arc<InMemorySessionStore>) {
    let config = LlmProviderConfig {
        base_url: Some(server.base_url.clone()),
        stream,
        max_retry_elapsed_seconds: 10,
        ..Default::default()
    };
    let store = Arc::new(InMemorySessionStore::default());
    let provider = Arc::new(GeminiProvider::with_api_key(&config, "fake-key"));
    let runtime = LlmAgentRuntime::new("buying_assistant", provider, store.clone(), &config)
        .with_system_prompt("You help people buy things.");

    let orchestrator = SessionOrchestrator::new(store.clone(), Arc::new(runtime), OrchestratorOptions::default());
    (orchestrator, store)
}

#[tokio::test]
async fn test_streamed_gemini_turn() {
    let server = FakeGeminiServer::start().await;
    let (orchestrator, store) = setup(&server, true);

    let reply = orchestrator
        .handle_turn("Best phone under 30000", &["Axis Ace".to_string()], None)
        .await;

    assert_eq!(reply.outcome, TurnOutcome::Answered);
    assert_eq!(reply.text, "You asked: Best phone under 30000");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let (call, api_key, body) = &requests[0];
    assert_eq!(call, "gemini-2.5-flash:streamGenerateContent");
    assert_eq!(api_key.as_deref(), Some("fake-key"));
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You help people buy things.");
    assert_eq!(body["tools"], json!([{ "google_search": {} }]));
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "Best phone under 30000\nUser Context (Cards): Axis Ace"
    );

    // The runtime keeps the exchange for the next turn
    let key = SessionKey::new("buying_assistant", "default_user", reply.session_id.clone());
    let history = store.history(&key).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, reply.text);
}

#[tokio::test]
async fn test_follow_up_turn_carries_history() {
    let server = FakeGeminiServer::start().await;
    let (orchestrator, _store) = setup(&server, true);

    let first = orchestrator.handle_turn("Need a laptop", &[], None).await;
    orchestrator
        .handle_turn("Budget is 1000", &[], Some(first.session_id.clone()))
        .await;

    let requests = server.requests();
    let contents = requests[1].2["contents"].as_array().unwrap().clone();
    let roles: Vec<&str> = contents.iter().map(|c| c["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
    assert_eq!(contents[1]["parts"][0]["text"], "You asked: Need a laptop");
}

#[tokio::test]
async fn test_non_streaming_gemini_turn() {
    let server = FakeGeminiServer::start().await;
    let (orchestrator, _store) = setup(&server, false);

    let reply = orchestrator.handle_turn("Cheapest tablet", &[], None).await;

    assert_eq!(reply.text, "You asked: Cheapest tablet");
    assert_eq!(server.requests()[0].0, "gemini-2.5-flash:generateContent");
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = FakeGeminiServer::start().await;
    server.state.unavailable_for.store(1, Ordering::SeqCst);
    let (orchestrator, _store) = setup(&server, true);

    let reply = orchestrator.handle_turn("Earbuds?", &[], None).await;

    assert_eq!(reply.outcome, TurnOutcome::Answered);
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_permanent_failure_becomes_error_reply() {
    let server = FakeGeminiServer::start().await;
    let (orchestrator, store) = setup(&server, true);

    let reply = orchestrator
        .handle_turn("FORBIDDEN question", &[], Some("s-1".to_string()))
        .await;

    assert_eq!(reply.outcome, TurnOutcome::Failed);
    assert!(reply.text.starts_with("Error communicating with agent: LLM error: "));
    assert!(reply.text.contains("400"));
    assert_eq!(server.requests().len(), 1);

    let key = SessionKey::new("buying_assistant", "default_user", "s-1");
    assert!(store.history(&key).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_endpoint_over_gemini() {
    let gemini = FakeGeminiServer::start().await;
    let (orchestrator, _store) = setup(&gemini, true);
    let server = TestServer::with_orchestrator(Arc::new(orchestrator)).await;

    let body: Value = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({ "message": "Which TV?", "cards": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["response"], "You asked: Which TV?");
    assert!(body["session_id"].as_str().is_some_and(|id| !id.is_empty()));
}
