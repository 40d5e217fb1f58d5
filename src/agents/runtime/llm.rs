//! In-process runtime backed by an LLM provider

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agents::config::LlmProviderConfig;
use crate::agents::domain::{
    AgentRuntime, Content, EventStream, EventStreamSender, FunctionCall, Message, Part,
    RuntimeEvent, SessionKey, MODEL_ROLE,
};
use crate::agents::error::{AgentError, AgentResult, LlmError};
use crate::agents::llm::{CompletionRequest, CompletionResponse, LlmProvider, StreamChunk, TokenUsage};
use crate::agents::session::ConversationHistory;

/// Runtime that answers turns with a single model call per turn
pub struct LlmAgentRuntime {
    name: String,
    llm: Arc<dyn LlmProvider>,
    history: Arc<dyn ConversationHistory>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    google_search: bool,
    stream: bool,
}

impl LlmAgentRuntime {
    pub fn new(
        name: impl Into<String>,
        llm: Arc<dyn LlmProvider>,
        history: Arc<dyn ConversationHistory>,
        config: &LlmProviderConfig,
    ) -> Self {
        Self {
            name: name.into(),
            llm,
            history,
            system_prompt: None,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            google_search: config.google_search,
            stream: config.stream,
        }
    }

    /// Set the system instruction sent with every turn
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = if prompt.trim().is_empty() { None } else { Some(prompt) };
        self
    }

    fn build_request(&self, prior: Vec<Message>, user: &Message) -> CompletionRequest {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system));
        }
        messages.extend(prior);
        messages.push(user.clone());

        CompletionRequest {
            messages,
            model: None,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            google_search: self.google_search,
        }
    }

    async fn stream_turn(
        llm: Arc<dyn LlmProvider>,
        history: Arc<dyn ConversationHistory>,
        key: SessionKey,
        author: String,
        user: Message,
        request: CompletionRequest,
        sender: EventStreamSender,
    ) {
        let mut stream = llm.complete_stream(request);
        let mut reply = String::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(chunk) => {
                    for event in chunk_events(&author, chunk, &mut reply) {
                        if sender.send(event).await.is_err() {
                            debug!(session_id = %key.session_id, "Turn stream dropped by consumer");
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = sender.send_error(AgentError::Llm(e)).await;
                    return;
                }
            }
        }

        record_turn(history.as_ref(), &key, user, reply).await;
        let _ = sender.send(RuntimeEvent::new(author).turn_complete()).await;
    }
}

/// Translate one streamed chunk into runtime events, appending its text to
/// `reply`
fn chunk_events(author: &str, chunk: StreamChunk, reply: &mut String) -> Vec<RuntimeEvent> {
    let mut events = Vec::new();

    if chunk.has_content() {
        reply.push_str(&chunk.content);
        events.push(
            RuntimeEvent::new(author)
                .with_content(Content::model_text(chunk.content))
                .partial(true),
        );
    }

    if !chunk.function_calls.is_empty() {
        events.push(RuntimeEvent::new(author).with_content(function_call_content(chunk.function_calls)));
    }

    if let Some(grounding) = chunk.grounding {
        events.push(RuntimeEvent::new(author).with_field("grounding_metadata", grounding));
    }

    if let Some(usage) = chunk.usage {
        events.push(RuntimeEvent::new(author).with_field("usage_metadata", usage_json(&usage)));
    }

    events
}

/// Translate a whole completion into the events of one turn
fn response_events(author: &str, response: CompletionResponse) -> Vec<RuntimeEvent> {
    let mut parts = Vec::new();
    if !response.content.is_empty() {
        parts.push(Part::text(response.content));
    }
    parts.extend(response.function_calls.into_iter().map(Part::function_call));

    let mut event = RuntimeEvent::new(author).turn_complete();
    if !parts.is_empty() {
        event = event.with_content(Content::with_role(MODEL_ROLE, parts));
    }
    if let Some(grounding) = response.grounding {
        event = event.with_field("grounding_metadata", grounding);
    }
    if let Some(usage) = response.usage {
        event = event.with_field("usage_metadata", usage_json(&usage));
    }
    vec![event]
}

fn function_call_content(calls: Vec<FunctionCall>) -> Content {
    Content::with_role(MODEL_ROLE, calls.into_iter().map(Part::function_call).collect())
}

fn usage_json(usage: &TokenUsage) -> serde_json::Value {
    json!({
        "prompt_token_count": usage.prompt_tokens,
        "candidates_token_count": usage.completion_tokens,
        "total_token_count": usage.total_tokens,
    })
}

async fn record_turn(history: &dyn ConversationHistory, key: &SessionKey, user: Message, reply: String) {
    if let Err(e) = history
        .append_history(key, vec![user, Message::assistant(reply)])
        .await
    {
        warn!(session_id = %key.session_id, error = %e, "Failed to record turn in history");
    }
}

#[async_trait]
impl AgentRuntime for LlmAgentRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit_turn(&self, key: &SessionKey, content: Content) -> AgentResult<EventStream> {
        let text = content.text();
        if text.trim().is_empty() {
            return Err(AgentError::Llm(LlmError::InvalidRequest(
                "turn content carries no text".to_string(),
            )));
        }

        let prior = self.history.history(key).await?;
        let user = Message::user(text);
        let request = self.build_request(prior, &user);

        debug!(
            session_id = %key.session_id,
            provider = self.llm.name(),
            model = self.llm.model(),
            messages = request.messages.len(),
            stream = self.stream,
            "Submitting turn"
        );

        if self.stream {
            let (sender, stream) = EventStream::channel(64);
            tokio::spawn(Self::stream_turn(
                Arc::clone(&self.llm),
                Arc::clone(&self.history),
                key.clone(),
                self.name.clone(),
                user,
                request,
                sender,
            ));
            return Ok(stream);
        }

        let response = self.llm.complete(request).await?;
        let reply = response.content.clone();
        record_turn(self.history.as_ref(), key, user, reply).await;
        Ok(EventStream::from_events(response_events(&self.name, response)))
    }
}
