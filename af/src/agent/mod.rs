//! Agent backends - the capability the conversation is driven against
//!
//! The orchestrator only sees the [`AgentBackend`] trait. The concrete
//! backend in this crate is [`LlmAgentBackend`], which renders prompts in a
//! chosen [`DocumentStyle`] and sends them through an [`crate::llm::LlmClient`].

use async_trait::async_trait;

mod error;
pub mod extract;
mod llm_backend;
pub mod prompts;

pub use error::AgentError;
pub use llm_backend::LlmAgentBackend;
pub use prompts::DocumentStyle;

use crate::domain::{ClarifyingQuestion, Document, ReadinessEvaluation, Turn};

/// The three operations a conversation needs from its agent
///
/// Implementations may block on a single call or consume a fragment stream;
/// either way they return the final result.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Produce the next clarifying question given everything said so far
    async fn ask_clarifying_question(
        &self,
        feature_request: &str,
        codebase_context: &str,
        history: &[Turn],
    ) -> Result<ClarifyingQuestion, AgentError>;

    /// Judge whether enough information has been gathered
    async fn evaluate_readiness(&self, history: &[Turn]) -> Result<ReadinessEvaluation, AgentError>;

    /// Write the decision record
    async fn generate_document(&self, history: &[Turn], feature_request: &str) -> Result<Document, AgentError>;
}
