//! Phase orchestration - drives one conversation from feature request to record
//!
//! ```text
//! start_planning ──► planning ──continue_conversation──► planning (not ready)
//!                        │
//!                        └──continue_conversation──► adr_generation (ready)
//!                                                        │
//!                                   generate_adr ◄───────┘
//!                                        │
//!                                        ▼
//!                                    completed
//!
//! reset: any phase ──► planning (history cleared)
//! ```
//!
//! The orchestrator owns the conversation state; nothing else mutates it.
//! Every backend call finishes before state is touched, so a failed call
//! leaves the conversation exactly as it was.

mod envelope;
mod error;

pub use envelope::Envelope;
pub use error::OrchestratorError;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::{AgentBackend, AgentError};
use crate::domain::{ConversationPhase, Document, SessionSnapshot, Turn};

/// Drives the planning → generation → completed lifecycle against an agent backend
pub struct PhaseOrchestrator {
    backend: Arc<dyn AgentBackend>,
    state: SessionSnapshot,
}

impl PhaseOrchestrator {
    /// Create an orchestrator with empty state in the `planning` phase
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        debug!("PhaseOrchestrator::new: called");
        Self {
            backend,
            state: SessionSnapshot::default(),
        }
    }

    /// Seed the conversation and ask the opening clarifying question
    ///
    /// Valid only in `planning` and with a non-blank feature request. Replaces
    /// any previous feature request, context and history.
    pub async fn start_planning(
        &mut self,
        feature_request: &str,
        codebase_context: &str,
    ) -> Result<Envelope, OrchestratorError> {
        const OPERATION: &str = "start_planning";
        debug!(%feature_request, context_len = %codebase_context.len(), "start_planning: called");
        self.require_phase(OPERATION, ConversationPhase::Planning)?;
        if feature_request.trim().is_empty() {
            debug!("start_planning: blank feature request");
            return Err(OrchestratorError::EmptyFeatureRequest);
        }

        let question = self
            .backend
            .ask_clarifying_question(feature_request, codebase_context, &[])
            .await
            .map_err(|e| self.backend_error(OPERATION, e))?;

        self.state.feature_request = feature_request.to_string();
        self.state.codebase_context = codebase_context.to_string();
        self.state.history = vec![Turn::agent(&question.content)];
        self.state.generated_document = None;

        info!(header = %question.answer.header, "Planning started");
        Ok(Envelope::PlanningQuestion(question))
    }

    /// Record the user's reply, then either ask again or move to generation
    pub async fn continue_conversation(&mut self, user_reply: &str) -> Result<Envelope, OrchestratorError> {
        const OPERATION: &str = "continue_conversation";
        debug!(reply_len = %user_reply.len(), "continue_conversation: called");
        self.require_phase(OPERATION, ConversationPhase::Planning)?;
        if self.state.feature_request.is_empty() {
            debug!("continue_conversation: no feature request yet");
            return Err(OrchestratorError::NotStarted { operation: OPERATION });
        }

        let mut history = self.state.history.clone();
        history.push(Turn::user(user_reply));

        let readiness = self
            .backend
            .evaluate_readiness(&history)
            .await
            .map_err(|e| self.backend_error(OPERATION, e))?;

        if readiness.ready_for_adr {
            info!(reasoning = %readiness.reasoning, "Ready for ADR generation");
            self.state.history = history;
            self.state.phase = ConversationPhase::AdrGeneration;
            return Ok(Envelope::ReadyForAdr(readiness));
        }

        debug!(missing = ?readiness.missing_information, "continue_conversation: not ready, asking again");
        let question = self
            .backend
            .ask_clarifying_question(&self.state.feature_request, &self.state.codebase_context, &history)
            .await
            .map_err(|e| self.backend_error(OPERATION, e))?;

        history.push(Turn::agent(&question.content));
        self.state.history = history;
        Ok(Envelope::PlanningQuestion(question))
    }

    /// Generate the record from the full history; valid only in `adr_generation`
    pub async fn generate_adr(&mut self) -> Result<Envelope, OrchestratorError> {
        const OPERATION: &str = "generate_adr";
        debug!(history_len = %self.state.history.len(), "generate_adr: called");
        self.require_phase(OPERATION, ConversationPhase::AdrGeneration)?;

        let document = self
            .backend
            .generate_document(&self.state.history, &self.state.feature_request)
            .await
            .map_err(|e| self.backend_error(OPERATION, e))?;

        self.state.history.push(Turn::agent(&document.content));
        self.state.generated_document = Some(document.clone());
        self.state.phase = ConversationPhase::Completed;

        info!(number = %document.number, title = %document.title, "ADR generated");
        Ok(Envelope::AdrGenerated(document))
    }

    /// Return to `planning` with empty state; valid from any phase
    pub fn reset(&mut self) {
        debug!(phase = %self.state.phase, "reset: called");
        self.state = SessionSnapshot::default();
    }

    pub fn current_phase(&self) -> ConversationPhase {
        self.state.phase
    }

    pub fn feature_request(&self) -> &str {
        &self.state.feature_request
    }

    pub fn codebase_context(&self) -> &str {
        &self.state.codebase_context
    }

    /// Read-only view of the conversation so far
    pub fn conversation_history(&self) -> &[Turn] {
        &self.state.history
    }

    pub fn generated_document(&self) -> Option<&Document> {
        self.state.generated_document.as_ref()
    }

    /// Snapshot of the full conversation state
    pub fn export_session(&self) -> SessionSnapshot {
        debug!(phase = %self.state.phase, history_len = %self.state.history.len(), "export_session: called");
        self.state.clone()
    }

    /// Replace state wholesale with `snapshot`
    ///
    /// No consistency checks are made between phase and history.
    pub fn import_session(&mut self, snapshot: SessionSnapshot) {
        debug!(phase = %snapshot.phase, history_len = %snapshot.history.len(), "import_session: called");
        let mut snapshot = snapshot;
        snapshot.phase = snapshot.phase.settled();
        self.state = snapshot;
    }

    fn require_phase(&self, operation: &'static str, expected: ConversationPhase) -> Result<(), OrchestratorError> {
        if self.state.phase == expected {
            Ok(())
        } else {
            debug!(%operation, phase = %self.state.phase, %expected, "require_phase: wrong phase");
            Err(OrchestratorError::InvalidPhaseTransition {
                operation,
                phase: self.state.phase,
            })
        }
    }

    fn backend_error(&self, operation: &'static str, source: AgentError) -> OrchestratorError {
        warn!(%operation, phase = %self.state.phase, error = %source, "Agent backend failed");
        OrchestratorError::Backend {
            operation,
            phase: self.state.phase,
            source,
        }
    }
}
