use async_trait::async_trait;
use buying_assistant::agents::domain::{AgentRuntime, Content, EventStream, SessionKey};
use buying_assistant::agents::error::{AgentError, AgentResult};
use buying_assistant::agents::orchestrator::{OrchestratorOptions, SessionOrchestrator};
use buying_assistant::agents::session::InMemorySessionStore;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// Runtime that answers "Echo: <text>" in two fragments, stays silent for
/// "SILENT" and breaks mid-stream for "FAIL"
pub struct EchoRuntime;

#[async_trait]
impl AgentRuntime for EchoRuntime {
    fn name(&self) -> &str {
        "echo"
    }

    async fn submit_turn(&self, _key: &SessionKey, content: Content) -> AgentResult<EventStream> {
        let text = content.text();
        let events = if text.starts_with("SILENT") {
            vec![Ok(json!({ "turn_complete": true }).into())]
        } else if text.starts_with("FAIL") {
            vec![
                Ok(json!({ "delta": "Echo: " }).into()),
                Err(AgentError::Runtime("upstream closed".to_string())),
            ]
        } else {
            vec![
                Ok(json!({ "content": { "parts": [{ "text": "Echo: " }] } }).into()),
                Ok(json!({ "usage_metadata": { "total_token_count": 1 } }).into()),
                Ok(json!({ "content": { "parts": [{ "text": text }] } }).into()),
            ]
        };
        Ok(EventStream::from_results(events))
    }
}

pub fn echo_orchestrator() -> Arc<SessionOrchestrator> {
    Arc::new(SessionOrchestrator::new(
        Arc::new(InMemorySessionStore::default()),
        Arc::new(EchoRuntime),
        OrchestratorOptions::default(),
    ))
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_orchestrator(echo_orchestrator()).await
    }

    pub async fn with_orchestrator(orchestrator: Arc<SessionOrchestrator>) -> Self {
        let app = buying_assistant::create_app(orchestrator, None);

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer { addr, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
