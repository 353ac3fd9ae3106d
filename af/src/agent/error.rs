//! Agent backend error types

use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised by an agent backend capability
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Backend returned no content for {operation}")]
    EmptyResponse { operation: &'static str },

    #[error("Backend returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Response for {operation} was cut off at the token limit")]
    Truncated { operation: &'static str },
}

impl AgentError {
    /// Whether retrying the same operation could reasonably succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Llm(e) => e.is_transient(),
            AgentError::EmptyResponse { .. } => true,
            AgentError::InvalidResponse(_) => true,
            // Same request, same limit
            AgentError::Truncated { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_errors_convert() {
        let err: AgentError = LlmError::Stream("reset".to_string()).into();
        assert!(matches!(err, AgentError::Llm(LlmError::Stream(_))));
        assert!(err.is_transient());
    }

    #[test]
    fn test_permanent_llm_error_is_not_transient() {
        let err: AgentError = LlmError::Config("no key".to_string()).into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_empty_response_names_operation() {
        let err = AgentError::EmptyResponse {
            operation: "generate_document",
        };
        assert_eq!(err.to_string(), "Backend returned no content for generate_document");
    }

    #[test]
    fn test_truncated_is_not_transient() {
        let err = AgentError::Truncated {
            operation: "generate_document",
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("token limit"));
    }
}
