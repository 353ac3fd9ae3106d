//! adrflow - conversational Architecture Decision Record generator
//!
//! A feature request goes in, an agent asks clarifying questions one at a
//! time, and once it judges the conversation complete it writes an ADR.
//!
//! # Core Concepts
//!
//! - **Streaming interpretation**: agent answers are re-parsed as fragments
//!   arrive, so headings and numbered options show up before the answer ends
//! - **Explicit phases**: `planning` → `adr_generation` → `completed`, with
//!   every transition guarded
//! - **Pluggable agent**: the orchestrator only sees [`agent::AgentBackend`]
//! - **Resumable**: state exports to a [`domain::SessionSnapshot`] and imports
//!   back unchanged
//!
//! # Modules
//!
//! - [`interpreter`] - Incremental markdown answer parsing
//! - [`orchestrator`] - Phase state machine and result envelopes
//! - [`agent`] - Agent backend trait and the LLM-backed implementation
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`session`] - Session snapshot persistence
//! - [`repl`] - Interactive terminal front end
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod interpreter;
pub mod llm;
pub mod orchestrator;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use agent::{AgentBackend, AgentError, DocumentStyle, LlmAgentBackend};
pub use config::{AdrConfig, Config, LlmConfig, SessionConfig};
pub use domain::{
    ClarifyingQuestion, ConversationPhase, DecisionOption, Document, ReadinessEvaluation, SelectableOption,
    SessionSnapshot, StructuredAnswer, Turn, TurnRole,
};
pub use interpreter::{ResponseInterpreter, parse_answer};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use orchestrator::{Envelope, OrchestratorError, PhaseOrchestrator};
pub use repl::ReplSession;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};
