//! Uniform response envelope returned by every phase-advancing call

use serde::{Deserialize, Serialize};

use crate::domain::{ClarifyingQuestion, Document, ReadinessEvaluation};

/// Tagged result of one orchestrator step
///
/// Serializes as `{"type": "planning_question" | "ready_for_adr" | "adr_generated", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Envelope {
    /// Another clarifying question; phase stays `planning`
    PlanningQuestion(ClarifyingQuestion),
    /// Enough gathered; phase is now `adr_generation`
    ReadyForAdr(ReadinessEvaluation),
    /// Record written; phase is now `completed`
    AdrGenerated(Document),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StructuredAnswer;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::ReadyForAdr(ReadinessEvaluation {
            ready_for_adr: true,
            missing_information: vec![],
            reasoning: "enough".to_string(),
        });

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "ready_for_adr");
        assert_eq!(value["data"]["readyForADR"], true);
    }

    #[test]
    fn test_planning_question_tag() {
        let envelope = Envelope::PlanningQuestion(ClarifyingQuestion {
            content: "# Q".to_string(),
            answer: StructuredAnswer::default(),
        });
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "planning_question");
        assert_eq!(value["data"]["content"], "# Q");
        assert_eq!(value["data"]["answer"]["bodyText"], "");
    }
}
