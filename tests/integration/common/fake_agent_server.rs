//! Minimal ADK-compatible agent server for exercising the remote backends

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeAgentState {
    pub sessions: Mutex<HashSet<String>>,
    pub session_posts: Mutex<Vec<String>>,
    pub runs: Mutex<Vec<Value>>,
}

pub struct FakeAgentServer {
    pub base_url: String,
    pub state: Arc<FakeAgentState>,
}

impl FakeAgentServer {
    pub async fn start() -> Self {
        let state = Arc::new(FakeAgentState::default());
        let app = Router::new()
            .route("/apps/:app/users/:user/sessions/:session", post(create_session))
            .route("/run_sse", post(run_sse))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    pub fn session_posts(&self) -> Vec<String> {
        self.state.session_posts.lock().unwrap().clone()
    }

    pub fn runs(&self) -> Vec<Value> {
        self.state.runs.lock().unwrap().clone()
    }
}

async fn create_session(
    State(state): State<Arc<FakeAgentState>>,
    Path((app, user, session)): Path<(String, String, String)>,
) -> impl IntoResponse {
    let id = format!("{}/{}/{}", app, user, session);
    state.session_posts.lock().unwrap().push(id.clone());

    if state.sessions.lock().unwrap().insert(id) {
        (StatusCode::OK, Json(json!({ "id": session })))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": format!("Session already exists: {}", session) })),
        )
    }
}

async fn run_sse(State(state): State<Arc<FakeAgentState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.runs.lock().unwrap().push(body.clone());

    let text = body["new_message"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    if text.starts_with("REJECT") {
        return (StatusCode::UNPROCESSABLE_ENTITY, "bad request").into_response();
    }

    let events: Vec<String> = if text.starts_with("QUOTA") {
        vec![
            json!({ "author": "buying_assistant", "content": { "parts": [{ "text": "Checking" }] } })
                .to_string(),
            json!({ "error": "429 RESOURCE_EXHAUSTED" }).to_string(),
        ]
    } else {
        vec![
            json!({ "author": "buying_assistant", "content": { "role": "model", "parts": [
                { "function_call": { "name": "google_search", "args": { "query": "laptop" } } }
            ]}})
            .to_string(),
            "this is not json".to_string(),
            json!({ "author": "buying_assistant", "content": { "role": "model", "parts": [{ "text": "Recommend X" }] }, "partial": true })
                .to_string(),
            json!({ "author": "buying_assistant", "content": { "role": "model", "parts": [{ "text": " because Y" }] }, "partial": true })
                .to_string(),
            json!({ "author": "buying_assistant", "usage_metadata": { "total_token_count": 42 }, "turn_complete": true })
                .to_string(),
        ]
    };

    let body: String = events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect();

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
