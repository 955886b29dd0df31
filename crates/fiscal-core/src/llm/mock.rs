//! Mock LLM provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::provider::{CompletionRequest, CompletionResponse, LlmProvider, StopReason, TokenUsage};
use crate::{Error, Result};

/// Mock LLM provider that returns canned responses.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect calls through another.
#[derive(Clone)]
pub struct MockLlmProvider {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    canned: Vec<String>,
    index: usize,
    failure: Option<String>,
    prompts: Vec<String>,
}

impl MockLlmProvider {
    /// Creates a new mock provider with canned responses.
    ///
    /// Responses are returned in order, cycling back to the first once all
    /// have been used.
    ///
    /// # Examples
    ///
    /// ```
    /// use fiscal_core::llm::MockLlmProvider;
    ///
    /// let provider = MockLlmProvider::new(vec![
    ///     "First response".to_string(),
    ///     "Second response".to_string(),
    /// ]);
    /// ```
    pub fn new(responses: Vec<String>) -> Self {
        Self::from_parts(responses, None)
    }

    /// Creates a mock provider with a single response.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Creates a mock provider whose every call fails with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_parts(Vec::new(), Some(message.into()))
    }

    fn from_parts(canned: Vec<String>, failure: Option<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                canned,
                index: 0,
                failure,
                prompts: Vec::new(),
            })),
        }
    }

    /// Number of calls received so far, including failed ones.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.prompts.len()
    }

    /// Text of every request received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.state.lock().await.prompts.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut state = self.state.lock().await;
        state.prompts.push(request.text());

        if let Some(message) = &state.failure {
            return Err(Error::provider(message.clone()));
        }
        if state.canned.is_empty() {
            return Err(Error::provider("mock provider has no canned responses"));
        }

        let content = state.canned[state.index].clone();
        state.index = (state.index + 1) % state.canned.len();

        Ok(CompletionResponse {
            content,
            tokens_used: TokenUsage {
                input: 10,
                output: 20,
            },
            stop_reason: StopReason::EndTurn,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_single_response() {
        let provider = MockLlmProvider::with_response("Test response");
        let text = provider.generate("Hello").await.unwrap();
        assert_eq!(text, "Test response");
        assert_eq!(provider.calls().await, 1);
    }

    #[tokio::test]
    async fn test_mock_provider_cycles() {
        let provider = MockLlmProvider::new(vec!["First".to_string(), "Second".to_string()]);

        assert_eq!(provider.generate("a").await.unwrap(), "First");
        assert_eq!(provider.generate("b").await.unwrap(), "Second");
        assert_eq!(provider.generate("c").await.unwrap(), "First");
    }

    #[tokio::test]
    async fn test_mock_provider_failing() {
        let provider = MockLlmProvider::failing("quota exceeded");
        let err = provider.generate("Hello").await.unwrap_err();
        assert!(err.is_provider());
        assert_eq!(provider.calls().await, 1);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider = MockLlmProvider::with_response("Shared");
        let observer = provider.clone();

        provider.generate("question one").await.unwrap();
        assert_eq!(observer.prompts().await, vec!["question one".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_provider_empty_is_error() {
        let provider = MockLlmProvider::new(Vec::new());
        assert!(provider.generate("x").await.is_err());
    }
}
