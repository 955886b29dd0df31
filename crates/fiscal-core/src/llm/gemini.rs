//! Google Gemini provider implementation.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, Role, StopReason, TokenUsage,
};
use crate::config::LlmConfig;
use crate::{Error, Result};

/// LLM provider using the Gemini `generateContent` REST endpoint.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI Studio API key
    /// * `model` - Model ID (e.g., "gemini-2.5-flash")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: LlmConfig::default().base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a provider from configuration; the API key is required.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::config("llm.api_key is not set (use FISCAL_LLM_API_KEY or the config file)")
            })?;
        Ok(Self::new(api_key, &config.model).with_base_url(&config.base_url))
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Builds the JSON body for a `generateContent` call.
fn request_body(request: &CompletionRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Model => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut generation = json!({ "maxOutputTokens": request.max_tokens });
    if let Some(temp) = request.temperature {
        generation["temperature"] = json!(temp);
    }
    if !request.stop_sequences.is_empty() {
        generation["stopSequences"] = json!(request.stop_sequences);
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation,
    });
    if let Some(system) = &request.system_prompt {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

/// Extracts text, usage, and stop reason from a `generateContent` response.
fn parse_response(body: &Value) -> Result<CompletionResponse> {
    let candidate = body["candidates"]
        .get(0)
        .ok_or_else(|| Error::provider("Gemini response has no candidates"))?;

    let parts = candidate["content"]["parts"]
        .as_array()
        .ok_or_else(|| Error::provider("Gemini candidate has no content parts"))?;

    let content: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .concat();

    if content.trim().is_empty() {
        return Err(Error::provider("Gemini returned empty text"));
    }

    let stop_reason = match candidate["finishReason"].as_str() {
        Some("STOP") | None => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("SAFETY") => StopReason::Safety,
        Some(_) => StopReason::Other,
    };

    let usage = &body["usageMetadata"];
    let tokens_used = TokenUsage {
        input: usage["promptTokenCount"].as_u64().unwrap_or(0),
        output: usage["candidatesTokenCount"].as_u64().unwrap_or(0),
    };

    Ok(CompletionResponse {
        content,
        tokens_used,
        stop_reason,
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = request_body(&request);
        log::debug!(
            "gemini request: model={}, max_tokens={}",
            self.model,
            request.max_tokens
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider_with_source("Failed to call Gemini API", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::provider(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| Error::provider_with_source("Failed to parse Gemini response", e))?;

        let completion = parse_response(&response_body)?;
        log::debug!(
            "gemini response: {} tokens, stop={:?}",
            completion.tokens_used.total(),
            completion.stop_reason
        );
        Ok(completion)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
