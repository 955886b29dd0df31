//! Deadline wrapper for LLM providers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::provider::{CompletionRequest, CompletionResponse, LlmProvider};
use crate::{Error, Result};

/// Wraps an LLM provider so that every call fails once a deadline passes.
///
/// An expired call is reported as a provider error and its future is
/// dropped, so no partial result reaches the caller.
pub struct TimeoutProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    /// Creates a wrapper with a 60 second deadline.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            inner: provider,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for TimeoutProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "{} call timed out after {:?}",
                    self.inner.name(),
                    self.timeout
                );
                Err(Error::provider(format!(
                    "{} call timed out after {}s",
                    self.inner.name(),
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llm::MockLlmProvider;

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(Error::provider("unreachable"))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_timeout_passes_through_success() {
        let mock = Arc::new(MockLlmProvider::with_response("Success"));
        let provider = TimeoutProvider::new(mock);
        assert_eq!(provider.generate("Test").await.unwrap(), "Success");
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn test_timeout_passes_through_failure() {
        let mock = Arc::new(MockLlmProvider::failing("down"));
        let provider = TimeoutProvider::new(mock);
        let err = provider.generate("Test").await.unwrap_err();
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_expires_as_provider_error() {
        let provider =
            TimeoutProvider::new(Arc::new(SlowProvider)).with_timeout(Duration::from_secs(5));
        let err = provider.generate("Test").await.unwrap_err();
        assert!(err.is_provider());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_timeout_outside_async_test() {
        let provider = TimeoutProvider::new(Arc::new(MockLlmProvider::with_response("Sync")));
        let text = tokio_test::block_on(provider.generate("Test"));
        tokio_test::assert_ok!(&text);
        assert_eq!(text.unwrap(), "Sync");
    }

    #[test]
    fn test_timeout_builder() {
        let mock = Arc::new(MockLlmProvider::with_response("Test"));
        let provider = TimeoutProvider::new(mock).with_timeout(Duration::from_millis(500));
        assert_eq!(provider.timeout, Duration::from_millis(500));
    }
}
