//! Domain types shared by the interpreter, the agent backends and the orchestrator

mod answer;
mod conversation;

pub use answer::{
    ClarifyingQuestion, DEFAULT_OPTION_PROMPT, DecisionOption, FREE_FORM_LABEL, FREE_FORM_VALUE, ReadinessEvaluation,
    SelectableOption, StructuredAnswer,
};
pub use conversation::{ConversationPhase, Document, SessionSnapshot, Turn, TurnRole};
