//! Streaming types for LLM responses

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::agents::domain::FunctionCall;
use crate::agents::error::LlmError;

/// A chunk of streamed LLM response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Delta content (text being generated)
    #[serde(default)]
    pub content: String,
    /// Function calls completed in this chunk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_calls: Vec<FunctionCall>,
    /// Search grounding metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding: Option<Value>,
    /// Finish reason (if this is the final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<super::FinishReason>,
    /// Token usage (usually only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<super::TokenUsage>,
}

impl StreamChunk {
    /// Create a text content chunk
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a finish chunk
    pub fn finish(reason: super::FinishReason, usage: Option<super::TokenUsage>) -> Self {
        Self {
            finish_reason: Some(reason),
            usage,
            ..Default::default()
        }
    }

    /// Check if this chunk has content
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Check if the chunk carries anything at all
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.function_calls.is_empty()
            && self.grounding.is_none()
            && self.finish_reason.is_none()
            && self.usage.is_none()
    }
}

/// Streaming response from an LLM provider
pub struct LlmStream {
    receiver: mpsc::Receiver<Result<StreamChunk, LlmError>>,
}

impl LlmStream {
    /// Create a new LLM stream from a channel receiver
    pub fn new(receiver: mpsc::Receiver<Result<StreamChunk, LlmError>>) -> Self {
        Self { receiver }
    }

    /// Create a channel pair for building an LLM stream
    pub fn channel(buffer: usize) -> (LlmStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (LlmStreamSender { sender: tx }, Self { receiver: rx })
    }
}

impl Stream for LlmStream {
    type Item = Result<StreamChunk, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sender half for building an LLM stream
#[derive(Clone)]
pub struct LlmStreamSender {
    sender: mpsc::Sender<Result<StreamChunk, LlmError>>,
}

impl LlmStreamSender {
    /// Send a chunk
    pub async fn send(&self, chunk: StreamChunk) -> Result<(), mpsc::error::SendError<Result<StreamChunk, LlmError>>> {
        self.sender.send(Ok(chunk)).await
    }

    /// Send an error
    pub async fn send_error(&self, error: LlmError) -> Result<(), mpsc::error::SendError<Result<StreamChunk, LlmError>>> {
        self.sender.send(Err(error)).await
    }

    /// Check if the receiver is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
