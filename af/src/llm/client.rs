//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CompletionRequest, CompletionResponse, LlmError, StreamChunk};

/// Stateless LLM client - each call is independent
///
/// Conversation state lives with the caller, which sends the whole history
/// on every request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Streaming completion for progressive rendering
    ///
    /// Sends chunks to the provided channel as they arrive.
    /// Returns the final complete response.
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Mock LLM client for unit tests
    ///
    /// Replays scripted responses in order. `stream` splits each response
    /// into fragments of `fragment_len` characters.
    pub struct MockLlmClient {
        responses: Vec<Result<CompletionResponse, String>>,
        call_count: AtomicUsize,
        fragment_len: usize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<CompletionResponse>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self::scripted(responses.into_iter().map(Ok).collect())
        }

        /// Script successes and failures; `Err` entries fail as an API error
        pub fn scripted(responses: Vec<Result<CompletionResponse, String>>) -> Self {
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                fragment_len: 7,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests received so far
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        fn next_response(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockLlmClient::next_response: fetching response");
            match self.responses.get(idx) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(message)) => Err(LlmError::ApiError {
                    status: 500,
                    message: message.clone(),
                }),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.next_response(request)
        }

        async fn stream(
            &self,
            request: CompletionRequest,
            chunk_tx: mpsc::Sender<StreamChunk>,
        ) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::stream: called");
            let response = self.next_response(request)?;

            let text = response.content.clone().unwrap_or_default();
            let chars: Vec<char> = text.chars().collect();
            for piece in chars.chunks(self.fragment_len) {
                let _ = chunk_tx.send(StreamChunk::TextDelta(piece.iter().collect())).await;
            }
            let _ = chunk_tx
                .send(StreamChunk::MessageDone {
                    stop_reason: response.stop_reason.clone(),
                    usage: response.usage.clone(),
                })
                .await;

            Ok(response)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn request() -> CompletionRequest {
            CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![],
                max_tokens: 1000,
            }
        }

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec![
                CompletionResponse::text("Response 1"),
                CompletionResponse::text("Response 2"),
            ]);

            let resp1 = client.complete(request()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(request()).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            assert!(client.complete(request()).await.is_err());
        }

        #[tokio::test]
        async fn test_mock_client_streams_fragments() {
            let client = MockLlmClient::new(vec![CompletionResponse::text("Hello streaming world")]);
            let (tx, mut rx) = mpsc::channel(64);

            let response = client.stream(request(), tx).await.unwrap();

            let mut text = String::new();
            let mut fragments = 0;
            while let Some(chunk) = rx.recv().await {
                if let StreamChunk::TextDelta(t) = chunk {
                    text.push_str(&t);
                    fragments += 1;
                }
            }
            assert_eq!(text, "Hello streaming world");
            assert!(fragments > 1);
            assert_eq!(response.content.as_deref(), Some("Hello streaming world"));
        }

        #[tokio::test]
        async fn test_mock_client_scripted_failure() {
            let client = MockLlmClient::scripted(vec![Err("overloaded".to_string())]);
            let err = client.complete(request()).await.unwrap_err();
            assert!(matches!(err, LlmError::ApiError { status: 500, .. }));
        }
    }
}
