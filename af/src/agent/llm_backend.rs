//! AgentBackend implementation on top of an LlmClient

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::extract::{parse_document, parse_readiness};
use super::prompts::{self, DocumentStyle};
use super::{AgentBackend, AgentError};
use crate::domain::{ClarifyingQuestion, Document, ReadinessEvaluation, StructuredAnswer, Turn};
use crate::interpreter::ResponseInterpreter;
use crate::llm::{CompletionRequest, LlmClient, Message, StopReason, StreamChunk};

/// Buffer between the streaming client and the interpreter
const CHUNK_BUFFER: usize = 256;

const QUESTION_MAX_TOKENS: u32 = 1024;
const READINESS_MAX_TOKENS: u32 = 512;
const DOCUMENT_MAX_TOKENS: u32 = 8192;

/// Agent that asks an LLM for questions, readiness and the final record
pub struct LlmAgentBackend {
    llm: Arc<dyn LlmClient>,
    style: DocumentStyle,
    document_number: String,
    progress: Option<mpsc::Sender<StructuredAnswer>>,
}

impl LlmAgentBackend {
    /// Create a backend using the given prompt style
    pub fn new(llm: Arc<dyn LlmClient>, style: DocumentStyle) -> Self {
        debug!(%style, "LlmAgentBackend::new: called");
        Self {
            llm,
            style,
            document_number: "0001".to_string(),
            progress: None,
        }
    }

    /// Number to give the record when the model does not supply one
    pub fn with_document_number(mut self, number: impl Into<String>) -> Self {
        self.document_number = number.into();
        self
    }

    /// Forward intermediate views of streamed questions to `tx`
    pub fn with_progress(mut self, tx: mpsc::Sender<StructuredAnswer>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn publish(&self, answer: &StructuredAnswer) {
        if let Some(tx) = &self.progress {
            // Intermediate views supersede each other, so a full channel just skips one
            let _ = tx.try_send(answer.clone());
        }
    }

    /// Stream a request through an interpreter and return the final text, parse and stop reason
    async fn stream_answer(
        &self,
        request: CompletionRequest,
    ) -> Result<(String, StructuredAnswer, StopReason), AgentError> {
        let (chunk_tx, mut chunk_rx) = mpsc::channel(CHUNK_BUFFER);
        let mut interpreter = ResponseInterpreter::new();

        let consume = async {
            while let Some(chunk) = chunk_rx.recv().await {
                match chunk {
                    StreamChunk::TextDelta(text) => {
                        let answer = interpreter.process_fragment(&text);
                        self.publish(answer);
                    }
                    StreamChunk::MessageDone { stop_reason, usage } => {
                        debug!(
                            ?stop_reason,
                            input_tokens = %usage.input_tokens,
                            output_tokens = %usage.output_tokens,
                            "stream_answer: message done"
                        );
                    }
                    StreamChunk::Error(e) => {
                        // The stream call itself returns the error below
                        warn!(error = %e, "stream_answer: stream reported error");
                    }
                }
            }
        };

        let (result, ()) = tokio::join!(self.llm.stream(request, chunk_tx), consume);
        let response = result?;

        let stop_reason = response.stop_reason;
        let content = response.content.unwrap_or_default();
        if interpreter.text() != content {
            debug!("stream_answer: streamed text differs from final content, re-parsing");
            interpreter.reset();
            interpreter.process_fragment(&content);
        }

        let answer = interpreter.finish();
        self.publish(&answer);
        Ok((content, answer, stop_reason))
    }
}

#[async_trait]
impl AgentBackend for LlmAgentBackend {
    async fn ask_clarifying_question(
        &self,
        feature_request: &str,
        codebase_context: &str,
        history: &[Turn],
    ) -> Result<ClarifyingQuestion, AgentError> {
        debug!(history_len = %history.len(), "ask_clarifying_question: called");
        let request = CompletionRequest {
            system_prompt: self.style.question_prompt(),
            messages: vec![Message::user(prompts::question_message(
                feature_request,
                codebase_context,
                history,
            ))],
            max_tokens: QUESTION_MAX_TOKENS,
        };

        let (content, answer, stop_reason) = self.stream_answer(request).await?;
        if content.trim().is_empty() {
            return Err(AgentError::EmptyResponse {
                operation: "ask_clarifying_question",
            });
        }
        if stop_reason == StopReason::MaxTokens {
            return Err(AgentError::Truncated {
                operation: "ask_clarifying_question",
            });
        }

        debug!(header = %answer.header, option_count = %answer.options.len(), "ask_clarifying_question: parsed");
        Ok(ClarifyingQuestion { content, answer })
    }

    async fn evaluate_readiness(&self, history: &[Turn]) -> Result<ReadinessEvaluation, AgentError> {
        debug!(history_len = %history.len(), "evaluate_readiness: called");
        let request = CompletionRequest {
            system_prompt: self.style.readiness_prompt().to_string(),
            messages: vec![Message::user(prompts::readiness_message(history))],
            max_tokens: READINESS_MAX_TOKENS,
        };

        let response = self.llm.complete(request).await?;
        let text = response.content.ok_or(AgentError::EmptyResponse {
            operation: "evaluate_readiness",
        })?;

        let evaluation = parse_readiness(&text)?;
        info!(ready = evaluation.ready_for_adr, missing = ?evaluation.missing_information, "Readiness evaluated");
        Ok(evaluation)
    }

    async fn generate_document(&self, history: &[Turn], feature_request: &str) -> Result<Document, AgentError> {
        debug!(history_len = %history.len(), number = %self.document_number, "generate_document: called");
        let request = CompletionRequest {
            system_prompt: self.style.document_prompt(),
            messages: vec![Message::user(prompts::document_message(
                feature_request,
                history,
                &self.document_number,
            ))],
            max_tokens: DOCUMENT_MAX_TOKENS,
        };

        let response = self.llm.complete(request).await?;
        let usage = response.usage;
        if response.stop_reason == StopReason::MaxTokens {
            return Err(AgentError::Truncated {
                operation: "generate_document",
            });
        }
        let content = response.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AgentError::EmptyResponse {
                operation: "generate_document",
            });
        }

        let document = parse_document(&content, &self.document_number);
        info!(
            number = %document.number,
            title = %document.title,
            input_tokens = %usage.input_tokens,
            output_tokens = %usage.output_tokens,
            "Document generated"
        );
        Ok(document)
    }
}
