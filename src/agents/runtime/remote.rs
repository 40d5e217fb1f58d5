//! Runtime that forwards turns to an ADK-compatible agent server
//!
//! A turn is `POST {base}/run_sse`; the reply is a `text/event-stream` whose
//! `data:` payloads are JSON events. They are passed on untouched as
//! [`AgentEvent::Raw`] so the extractor can probe whatever shape the server
//! produces.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::agents::config::RemoteRuntimeConfig;
use crate::agents::domain::{AgentEvent, AgentRuntime, Content, EventStream, EventStreamSender, SessionKey};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::http::{endpoint_url, parse_base_url, SseDecoder};

pub struct RemoteAgentRuntime {
    client: reqwest::Client,
    run_url: Url,
    streaming: bool,
}

impl RemoteAgentRuntime {
    pub fn new(config: &RemoteRuntimeConfig) -> AgentResult<Self> {
        let base_url = parse_base_url(&config.base_url).map_err(AgentError::Configuration)?;
        let run_url = endpoint_url(&base_url, &["run_sse"]).map_err(AgentError::Configuration)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            run_url,
            streaming: config.streaming,
        })
    }

    async fn relay(response: reqwest::Response, sender: EventStreamSender) {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = sender
                        .send_error(AgentError::Runtime(format!("agent stream interrupted: {}", e)))
                        .await;
                    return;
                }
            };

            for payload in decoder.push(&bytes) {
                if !forward(&sender, &payload).await {
                    return;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            forward(&sender, &payload).await;
        }
    }
}

/// Forward one SSE payload; returns false once the stream should stop
async fn forward(sender: &EventStreamSender, payload: &str) -> bool {
    let event: Value = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Skipping undecodable agent event");
            return true;
        }
    };

    if let Some(message) = event.get("error").and_then(Value::as_str) {
        let _ = sender
            .send_error(AgentError::Runtime(message.to_string()))
            .await;
        return false;
    }

    sender.send(AgentEvent::Raw(event)).await.is_ok()
}

#[async_trait]
impl AgentRuntime for RemoteAgentRuntime {
    fn name(&self) -> &str {
        "remote"
    }

    async fn submit_turn(&self, key: &SessionKey, content: Content) -> AgentResult<EventStream> {
        let body = json!({
            "app_name": key.app_name,
            "user_id": key.user_id,
            "session_id": key.session_id,
            "new_message": serde_json::to_value(&content)?,
            "streaming": self.streaming,
        });

        debug!(session_id = %key.session_id, url = %self.run_url, "Submitting turn to agent server");

        let response = self
            .client
            .post(self.run_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Runtime(format!("agent server unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Runtime(format!(
                "agent server returned {}: {}",
                status, detail
            )));
        }

        let (sender, stream) = EventStream::channel(64);
        tokio::spawn(Self::relay(response, sender));
        Ok(stream)
    }
}
