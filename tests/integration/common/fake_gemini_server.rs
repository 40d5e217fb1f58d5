//! Stand-in for the Gemini `generateContent` endpoints

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeGeminiState {
    /// Number of leading requests answered with 503
    pub unavailable_for: AtomicUsize,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<(String, Option<String>, Value)>>,
}

pub struct FakeGeminiServer {
    pub base_url: String,
    pub state: Arc<FakeGeminiState>,
}

impl FakeGeminiServer {
    pub async fn start() -> Self {
        let state = Arc::new(FakeGeminiState::default());
        let app = Router::new()
            .route("/v1beta/models/:call", post(generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    /// (model call, api key header, body) of every request received
    pub fn requests(&self) -> Vec<(String, Option<String>, Value)> {
        self.state.requests.lock().unwrap().clone()
    }
}

fn last_user_text(body: &Value) -> String {
    body["contents"]
        .as_array()
        .and_then(|c| c.last())
        .and_then(|c| c["parts"][0]["text"].as_str())
        .unwrap_or_default()
        .to_string()
}

async fn generate(
    State(state): State<Arc<FakeGeminiState>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .unwrap()
        .push((call.clone(), api_key, body.clone()));

    let attempt = state.calls.fetch_add(1, Ordering::SeqCst);
    if attempt < state.unavailable_for.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
    }

    let question = last_user_text(&body);
    if question.starts_with("FORBIDDEN") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": { "message": "bad prompt" } })))
            .into_response();
    }

    let answer = format!("You asked: {}", question.lines().next().unwrap_or_default());

    if call.ends_with(":streamGenerateContent") {
        let (head, tail) = answer.split_at(answer.len() / 2);
        let chunks = [
            json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": head }] } }] }),
            json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": tail }] },
                "finishReason": "STOP",
                "groundingMetadata": { "webSearchQueries": ["question"] } }],
                "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 10 } }),
        ];
        let body: String = chunks
            .iter()
            .map(|c| format!("data: {}\r\n\r\n", c))
            .collect();
        return ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response();
    }

    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": answer }] },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}
