//! Google Gemini LLM Provider with streaming support

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::warn;

use super::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, LlmStream, LlmStreamSender,
    StreamChunk, TokenUsage,
};
use crate::agents::config::LlmProviderConfig;
use crate::agents::domain::{FunctionCall, Message, Role};
use crate::agents::error::{LlmError, LlmResult};
use crate::agents::http::SseDecoder;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Google Gemini LLM Provider
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_temperature: Option<f32>,
    default_max_tokens: Option<u32>,
    max_retry_elapsed: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider, reading the API key from the environment
    pub fn new(config: &LlmProviderConfig) -> LlmResult<Self> {
        let api_key = match &config.api_key_env {
            Some(env_var) => env::var(env_var).map_err(|_| {
                LlmError::Authentication(format!("Environment variable {} not set", env_var))
            })?,
            None => DEFAULT_KEY_VARS
                .iter()
                .find_map(|var| env::var(var).ok())
                .ok_or_else(|| {
                    LlmError::Authentication(
                        "GOOGLE_API_KEY environment variable not set".to_string(),
                    )
                })?,
        };

        Ok(Self::with_api_key(config, api_key))
    }

    /// Create a new Gemini provider with an explicit API key
    pub fn with_api_key(config: &LlmProviderConfig, api_key: impl Into<String>) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
            max_retry_elapsed: Duration::from_secs(config.max_retry_elapsed_seconds),
        }
    }

    /// Build the request body for Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let (system_instruction, contents) = convert_messages(&request.messages);

        let mut body = json!({ "contents": contents });

        if let Some(system) = system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        // Generation config
        let mut generation_config = json!({});

        if let Some(temp) = request.temperature.or(self.default_temperature) {
            generation_config["temperature"] = json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens.or(self.default_max_tokens) {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }

        if generation_config.as_object().map_or(false, |o| !o.is_empty()) {
            body["generationConfig"] = generation_config;
        }

        if request.google_search {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        body
    }

    fn endpoint(base_url: &str, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", base_url, model, method)
    }

    /// Parse a non-streaming response
    fn parse_response(response: GeminiResponse) -> LlmResult<CompletionResponse> {
        let usage = response.usage_metadata.as_ref().map(convert_usage);

        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
                    Some(_) => LlmError::ContentFiltered,
                    None => LlmError::Parse("No candidates in response".to_string()),
                })
            }
        };

        let (content, function_calls) = split_parts(candidate.content);

        let finish_reason = if function_calls.is_empty() {
            convert_finish_reason(candidate.finish_reason.as_deref())
        } else {
            FinishReason::ToolCalls
        };

        Ok(CompletionResponse {
            content,
            function_calls,
            finish_reason,
            usage,
            grounding: candidate.grounding_metadata,
        })
    }

    /// Map one streamed payload to a chunk
    fn parse_stream_payload(payload: &str) -> Option<StreamChunk> {
        let parsed = match serde_json::from_str::<GeminiResponse>(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable Gemini stream payload");
                return None;
            }
        };

        let mut chunk = StreamChunk {
            usage: parsed.usage_metadata.as_ref().map(convert_usage),
            ..Default::default()
        };

        if let Some(candidate) = parsed.candidates.into_iter().next() {
            let (content, function_calls) = split_parts(candidate.content);
            chunk.content = content;
            chunk.function_calls = function_calls;
            chunk.grounding = candidate.grounding_metadata;
            chunk.finish_reason = candidate
                .finish_reason
                .as_deref()
                .map(|r| convert_finish_reason(Some(r)));
        }

        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

/// Split system messages into the system instruction; map the rest to
/// Gemini `contents`
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for m in messages {
        match m.role {
            Role::System => system_parts.push(m.content.as_str()),
            Role::User => contents.push(json!({
                "role": "user",
                "parts": [{ "text": m.content }]
            })),
            Role::Assistant => {
                if !m.content.is_empty() {
                    contents.push(json!({
                        "role": "model",
                        "parts": [{ "text": m.content }]
                    }));
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, contents)
}

fn split_parts(content: Option<GeminiContent>) -> (String, Vec<FunctionCall>) {
    let mut text = String::new();
    let mut function_calls = Vec::new();

    for part in content.and_then(|c| c.parts).unwrap_or_default() {
        // Thought summaries are not part of the reply
        if part.thought.unwrap_or(false) {
            continue;
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(fc) = part.function_call {
            function_calls.push(FunctionCall {
                name: fc.name,
                args: fc.args.unwrap_or(Value::Object(Default::default())),
            });
        }
    }

    (text, function_calls)
}

fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Stop,
    }
}

fn convert_usage(usage: &GeminiUsageMetadata) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_token_count.unwrap_or(0),
        completion_tokens: usage.candidates_token_count.unwrap_or(0),
        total_tokens: usage.total_token_count.unwrap_or(0),
    }
}

fn status_error(status: u16, message: String) -> LlmError {
    match status {
        429 => LlmError::RateLimited(message),
        401 | 403 => LlmError::Authentication(message),
        _ => LlmError::Api { status, message },
    }
}

fn classify(err: LlmError) -> backoff::Error<LlmError> {
    if err.is_transient() {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

/// POST a request, retrying transient failures with exponential backoff
/// until `max_elapsed` has passed
async fn post_with_retry(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Value,
    max_elapsed: Duration,
) -> LlmResult<reqwest::Response> {
    let policy = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(max_elapsed))
        .build();

    backoff::future::retry(policy, move || async move {
        let response = client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(LlmError::from(e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let err = status_error(status.as_u16(), message);
        if err.is_transient() {
            warn!(status = status.as_u16(), "Transient Gemini failure, retrying");
        }
        Err(classify(err))
    })
    .await
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let body = self.build_request_body(&request);
        let model = request.model.as_ref().unwrap_or(&self.model);
        let url = Self::endpoint(&self.base_url, model, "generateContent");

        let response =
            post_with_retry(&self.client, &url, &self.api_key, &body, self.max_retry_elapsed)
                .await?;

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(gemini_response)
    }

    fn complete_stream(&self, request: CompletionRequest) -> LlmStream {
        let (sender, stream) = LlmStream::channel(64);

        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let url = format!(
            "{}?alt=sse",
            Self::endpoint(&self.base_url, &model, "streamGenerateContent")
        );
        let body = self.build_request_body(&request);
        let max_elapsed = self.max_retry_elapsed;

        tokio::spawn(async move {
            let result =
                Self::stream_completion(client, url, api_key, body, max_elapsed, sender.clone())
                    .await;
            if let Err(e) = result {
                let _ = sender.send_error(e).await;
            }
        });

        stream
    }
}

impl GeminiProvider {
    async fn stream_completion(
        client: reqwest::Client,
        url: String,
        api_key: String,
        body: Value,
        max_elapsed: Duration,
        sender: LlmStreamSender,
    ) -> LlmResult<()> {
        let response = post_with_retry(&client, &url, &api_key, &body, max_elapsed).await?;

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result.map_err(|e| LlmError::Streaming(e.to_string()))?;

            for payload in decoder.push(&bytes) {
                if let Some(chunk) = Self::parse_stream_payload(&payload) {
                    if sender.send(chunk).await.is_err() {
                        return Ok(()); // Receiver dropped
                    }
                }
            }
        }

        if let Some(chunk) = decoder.finish().and_then(|p| Self::parse_stream_payload(&p)) {
            let _ = sender.send(chunk).await;
        }

        Ok(())
    }
}

// Gemini API response types; streamed payloads share the same shape

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    thought: Option<bool>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}
