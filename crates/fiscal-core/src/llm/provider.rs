//! LLM provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Abstraction over the remote language model.
///
/// Every call is a single attempt: implementations never retry, and any
/// transport, quota, or decode problem surfaces as
/// [`Error::Provider`](crate::Error::Provider).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Completes a request and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Sends a single user prompt and returns the generated text.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.complete(CompletionRequest::prompt(prompt)).await?;
        Ok(response.content)
    }

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// A request to complete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instructions.
    pub system_prompt: Option<String>,

    /// Conversation messages.
    pub messages: Vec<Message>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Stop sequences.
    pub stop_sequences: Vec<String>,
}

impl CompletionRequest {
    /// Creates a request with default settings.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            system_prompt: None,
            messages,
            max_tokens: 2048,
            temperature: None,
            stop_sequences: Vec::new(),
        }
    }

    /// Creates a request holding one user message.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the temperature when one is configured.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Adds a stop sequence.
    pub fn with_stop_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.stop_sequences.push(sequence.into());
        self
    }

    /// Concatenated text of every message, used by test doubles.
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender.
    pub role: Role,

    /// Text content.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a model message.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User turn.
    User,
    /// Model turn.
    Model,
}

/// Response from an LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,

    /// Token accounting, when the provider reports it.
    pub tokens_used: TokenUsage,

    /// Why generation stopped.
    pub stop_reason: StopReason,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input: u64,

    /// Generated tokens.
    pub output: u64,
}

impl TokenUsage {
    /// Total tokens used (input + output).
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// Reason why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    /// Finished naturally.
    EndTurn,

    /// Hit the token limit.
    MaxTokens,

    /// Blocked by the provider's safety filter.
    Safety,

    /// Any other provider-specific reason.
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, Role::User);

        let model_msg = Message::model("Hi");
        assert_eq!(model_msg.role, Role::Model);
        assert_eq!(model_msg.content, "Hi");
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::prompt("Test")
            .with_system_prompt("You are an accountant")
            .with_max_tokens(512)
            .with_temperature(Some(0.2))
            .with_stop_sequence("\n\n");

        assert_eq!(request.messages, vec![Message::user("Test")]);
        assert_eq!(
            request.system_prompt.as_deref(),
            Some("You are an accountant")
        );
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.stop_sequences, vec!["\n\n"]);
    }

    #[test]
    fn test_request_text_joins_messages() {
        let request = CompletionRequest::new(vec![Message::user("a"), Message::model("b")]);
        assert_eq!(request.text(), "a\nb");
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input: 100,
            output: 200,
        };
        assert_eq!(usage.total(), 300);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }
}
