//! Orchestrator error types

use thiserror::Error;

use crate::agent::AgentError;
use crate::domain::ConversationPhase;

/// Errors surfaced by phase-advancing operations
///
/// On every error the conversation state is exactly as it was before the call,
/// so retrying the same operation is safe.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The agent backend failed while serving `operation`
    #[error("{operation} failed during {phase} phase: {source}")]
    Backend {
        operation: &'static str,
        phase: ConversationPhase,
        #[source]
        source: AgentError,
    },

    /// `operation` is not supported in the current phase
    #[error("{operation} is not allowed in {phase} phase")]
    InvalidPhaseTransition {
        operation: &'static str,
        phase: ConversationPhase,
    },

    /// A reply was sent before the conversation was started
    #[error("{operation} requires start_planning first")]
    NotStarted { operation: &'static str },

    /// `start_planning` was given a blank feature request
    #[error("feature request must not be empty")]
    EmptyFeatureRequest,
}

impl OrchestratorError {
    /// True for backend failures, as opposed to caller sequencing mistakes
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, OrchestratorError::Backend { .. })
    }

    /// True when the backend failure looks temporary and the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Backend { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}
