//! Agent runtimes
//!
//! - [`LlmAgentRuntime`] drives an [`LlmProvider`](crate::agents::llm::LlmProvider)
//!   in-process and keeps conversation history in a
//!   [`ConversationHistory`](crate::agents::session::ConversationHistory)
//! - [`RemoteAgentRuntime`] forwards turns to an ADK-compatible agent server

mod llm;
mod remote;

pub use llm::LlmAgentRuntime;
pub use remote::RemoteAgentRuntime;
