//! Conversational agent layer
//!
//! ## Architecture
//!
//! - `domain/` - Core types (SessionKey, Content, events, the `AgentRuntime` port)
//! - `extract` / `aggregate` - Turn text extraction and aggregation
//! - `orchestrator` - Session orchestration, the entry point for a turn
//! - `session/` - Session store backends
//! - `runtime/` - Agent runtimes (in-process LLM, remote agent server)
//! - `llm/` - LLM provider implementations with streaming

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod runtime;
pub mod session;

// Re-export commonly used types
pub use config::*;
pub use domain::*;
pub use error::*;
pub use orchestrator::{OrchestratorOptions, SessionOrchestrator, TurnOutcome, TurnReply};
