use super::common;

use common::test_server::TestServer;
use serde_json::{json, Value};

async fn chat(server: &TestServer, body: Value) -> Value {
    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_chat_returns_reply_and_new_session() {
    let server = TestServer::new().await;

    let body = chat(&server, json!({ "message": "Best laptop?", "cards": ["HDFC Regalia"] })).await;

    assert_eq!(
        body["response"],
        "Echo: Best laptop?\nUser Context (Cards): HDFC Regalia"
    );
    let session_id = body["session_id"].as_str().unwrap();
    assert!(!session_id.is_empty());
}

#[tokio::test]
async fn test_chat_keeps_supplied_session() {
    let server = TestServer::new().await;

    let first = chat(&server, json!({ "message": "hi" })).await;
    let second = chat(
        &server,
        json!({ "message": "again", "session_id": first["session_id"] }),
    )
    .await;

    assert_eq!(first["session_id"], second["session_id"]);
    assert_eq!(second["response"], "Echo: again");
}

#[tokio::test]
async fn test_chat_failure_is_still_200() {
    let server = TestServer::new().await;

    let body = chat(&server, json!({ "message": "FAIL please", "session_id": "s-9" })).await;

    assert_eq!(
        body["response"],
        "Error communicating with agent: Runtime error: upstream closed"
    );
    assert_eq!(body["session_id"], "s-9");
}

#[tokio::test]
async fn test_chat_empty_turn_uses_fallback() {
    let server = TestServer::new().await;

    let body = chat(&server, json!({ "message": "SILENT" })).await;
    assert_eq!(body["response"], "No response generated");
}

#[tokio::test]
async fn test_chat_rejects_body_without_message() {
    let server = TestServer::new().await;

    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({ "cards": [] }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_concurrent_chats_get_distinct_sessions() {
    let server = TestServer::new().await;

    let turns = (0..8).map(|i| {
        let url = server.url("/api/chat");
        async move {
            let body: Value = reqwest::Client::new()
                .post(url)
                .json(&json!({ "message": format!("q{}", i) }))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            (i, body)
        }
    });

    let results = futures::future::join_all(turns).await;
    let mut ids: Vec<String> = Vec::new();
    for (i, body) in results {
        assert_eq!(body["response"], format!("Echo: q{}", i));
        ids.push(body["session_id"].as_str().unwrap().to_string());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
