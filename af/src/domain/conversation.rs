//! Conversation state types: phases, turns, generated documents and snapshots

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stage of the fixed conversation lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Asking clarifying questions (initial)
    #[default]
    Planning,
    /// Transient; folded into `AdrGeneration` on entry
    ReadyForGeneration,
    /// Enough information gathered, document not yet generated
    AdrGeneration,
    /// Document generated (terminal until reset)
    Completed,
}

impl ConversationPhase {
    /// Resolve transient phases to the phase actually entered
    pub fn settled(self) -> Self {
        match self {
            Self::ReadyForGeneration => {
                debug!("ConversationPhase::settled: folding ReadyForGeneration into AdrGeneration");
                Self::AdrGeneration
            }
            other => other,
        }
    }

    /// Wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::ReadyForGeneration => "ready_for_generation",
            Self::AdrGeneration => "adr_generation",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
}

/// One role-tagged message in conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        debug!("Turn::user: called");
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an agent turn
    pub fn agent(content: impl Into<String>) -> Self {
        debug!("Turn::agent: called");
        Self {
            role: TurnRole::Agent,
            content: content.into(),
        }
    }
}

/// The generated decision record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full markdown
    pub content: String,
    pub title: String,
    /// Record number, e.g. "0007"
    pub number: String,
    /// Body of the implementation plan section, empty if absent
    #[serde(default)]
    pub implementation_plan: String,
}

/// Serializable snapshot of a whole conversation
///
/// Import does not check phase against history; a `completed` snapshot with no
/// history is accepted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub feature_request: String,
    #[serde(default)]
    pub codebase_context: String,
    pub phase: ConversationPhase,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub generated_document: Option<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_wire_names() {
        assert_eq!(serde_json::to_string(&ConversationPhase::Planning).unwrap(), "\"planning\"");
        assert_eq!(
            serde_json::to_string(&ConversationPhase::ReadyForGeneration).unwrap(),
            "\"ready_for_generation\""
        );
        assert_eq!(
            serde_json::to_string(&ConversationPhase::AdrGeneration).unwrap(),
            "\"adr_generation\""
        );
        assert_eq!(ConversationPhase::Completed.to_string(), "completed");
    }

    #[test]
    fn test_phase_settled() {
        assert_eq!(
            ConversationPhase::ReadyForGeneration.settled(),
            ConversationPhase::AdrGeneration
        );
        assert_eq!(ConversationPhase::Planning.settled(), ConversationPhase::Planning);
        assert_eq!(ConversationPhase::Completed.settled(), ConversationPhase::Completed);
    }

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("use token bucket");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "use token bucket");
        assert_eq!(Turn::agent("hi").role, TurnRole::Agent);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot = SessionSnapshot {
            feature_request: "Add rate limiting".to_string(),
            codebase_context: "axum service".to_string(),
            phase: ConversationPhase::AdrGeneration,
            history: vec![Turn::agent("Which algorithm?"), Turn::user("token bucket")],
            generated_document: None,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["featureRequest"], "Add rate limiting");
        assert_eq!(value["phase"], "adr_generation");
        assert_eq!(value["history"][1]["role"], "user");
        assert!(value["generatedDocument"].is_null());
    }

    #[test]
    fn test_snapshot_tolerates_missing_optional_fields() {
        let json = r#"{"featureRequest": "x", "phase": "completed"}"#;
        let snapshot: SessionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.phase, ConversationPhase::Completed);
        assert!(snapshot.history.is_empty());
        assert!(snapshot.generated_document.is_none());
    }
}
