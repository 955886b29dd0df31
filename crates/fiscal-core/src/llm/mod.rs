//! LLM provider abstractions and implementations.

mod gemini;
mod mock;
mod provider;
mod timeout;

use std::sync::Arc;
use std::time::Duration;

pub use gemini::GeminiProvider;
pub use mock::MockLlmProvider;
pub use provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Message, Role, StopReason, TokenUsage,
};
pub use timeout::TimeoutProvider;

use crate::config::LlmConfig;
use crate::{Error, Result};

/// Builds the configured provider, wrapped with the configured deadline.
///
/// The "mock" provider echoes a fixed acknowledgement and is meant for
/// offline runs and demos.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let inner: Arc<dyn LlmProvider> = match config.provider.as_str() {
        "gemini" => Arc::new(GeminiProvider::from_config(config)?),
        "mock" => Arc::new(MockLlmProvider::with_response(
            "Mock provider: no language model configured.",
        )),
        other => {
            return Err(Error::config(format!(
                "Unknown LLM provider: '{other}'. Supported: gemini, mock"
            )));
        }
    };
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    Ok(Arc::new(TimeoutProvider::new(inner).with_timeout(timeout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_mock() {
        let config = LlmConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config).map(|p| p.name().to_string());
        assert_eq!(provider.ok().as_deref(), Some("mock"));
    }

    #[test]
    fn test_create_provider_unknown() {
        let config = LlmConfig {
            provider: "nope".to_string(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_create_provider_gemini_without_key() {
        assert!(create_provider(&LlmConfig::default()).is_err());
    }
}
