//! Question answering over the stored invoices.
//!
//! Two strategies share one prompt shape:
//!
//! - **simple**: the whole relational snapshot is the context. Complete,
//!   but the prompt grows with every stored row.
//! - **embeddings**: only the entities behind the top-k most similar
//!   embeddings are the context. Bounded, at the cost of completeness.
//!
//! Each strategy makes exactly one answer call to the LLM. Failures of that
//! call, and an empty embedding store, are reported inside
//! [`AnswerResult`]; store and vector invariant failures are returned as
//! errors.

use fiscal_core::config::{EmbeddingConfig, LlmConfig};
use fiscal_core::llm::{CompletionRequest, LlmProvider};
use fiscal_core::{Error, Result};
use fiscal_store::Database;
use fiscal_vector::{EntityEmbeddingStore, SimilarityResult, rank};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::{ContextAssembler, RetrievedContext};

const ANSWER_INSTRUCTIONS: &str = "You are a financial assistant for a farm's accounts payable. \
     Answer the question using only the records in the context, which is JSON \
     with persons (suppliers and billed parties), expense classifications, and \
     movements (invoices with installments). If the context does not contain \
     the answer, say so. Answer in the language of the question.";

/// Which strategy produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerMethod {
    /// Whole-dataset context.
    Simple,
    /// Top-k similarity context.
    Embeddings,
}

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    /// Whether `answer_text` is present.
    pub success: bool,

    /// The model's answer, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,

    /// Strategy used.
    pub method: AnswerMethod,

    /// Failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Ranked matches behind an embeddings answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarities: Option<Vec<SimilarityResult>>,
}

impl AnswerResult {
    fn answered(method: AnswerMethod, text: String) -> Self {
        Self {
            success: true,
            answer_text: Some(text),
            method,
            error_message: None,
            similarities: None,
        }
    }

    fn failed(method: AnswerMethod, error: &Error) -> Self {
        Self {
            success: false,
            answer_text: None,
            method,
            error_message: Some(error.to_string()),
            similarities: None,
        }
    }

    fn with_similarities(mut self, similarities: Vec<SimilarityResult>) -> Self {
        self.similarities = Some(similarities);
        self
    }
}

/// The retrieval-then-generate orchestrator and its administrative surface.
#[derive(Clone)]
pub struct AnswerGenerator {
    db: Database,
    embeddings: EntityEmbeddingStore,
    llm: Arc<dyn LlmProvider>,
    assembler: ContextAssembler,
    top_k: usize,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl AnswerGenerator {
    /// Create a generator over the two stores and the LLM.
    pub fn new(
        db: Database,
        embeddings: EntityEmbeddingStore,
        llm: Arc<dyn LlmProvider>,
        config: &EmbeddingConfig,
    ) -> Self {
        let defaults = LlmConfig::default();
        Self {
            assembler: ContextAssembler::new(db.clone()),
            db,
            embeddings,
            llm,
            top_k: config.top_k,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Apply the answer call's token budget and temperature.
    pub fn with_llm_config(mut self, config: &LlmConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self
    }

    /// Answer from the full relational snapshot.
    pub async fn answer_simple(&self, question: &str) -> Result<AnswerResult> {
        let method = AnswerMethod::Simple;
        let snapshot = self.db.snapshot().await?;
        log::debug!("simple answer over {} rows", snapshot.len());

        let context = self.assembler.assemble_full(snapshot);
        Ok(match self.generate(&context, question).await? {
            Ok(text) => AnswerResult::answered(method, text),
            Err(e) => AnswerResult::failed(method, &e),
        })
    }

    /// Answer from the top-k entities most similar to `question`.
    ///
    /// An empty embedding store is reported before any LLM call, including
    /// the one the primary encoder would make for the question.
    pub async fn answer_with_embeddings(&self, question: &str) -> Result<AnswerResult> {
        let method = AnswerMethod::Embeddings;
        let records = self.embeddings.scan_all().await?;
        if records.is_empty() {
            log::info!("embeddings answer requested with an empty store");
            return Ok(AnswerResult::failed(method, &Error::NoEmbeddings));
        }

        let query = self.embeddings.encoder().encode(question).await;
        let similarities = rank(&query, &records, self.top_k)?;
        let context = self.assembler.assemble(&similarities).await?;
        log::debug!(
            "embeddings answer: {} candidates, {} ranked, {} resolved",
            records.len(),
            similarities.len(),
            context.len()
        );

        let result = match self.generate(&context, question).await? {
            Ok(text) => AnswerResult::answered(method, text),
            Err(e) => AnswerResult::failed(method, &e),
        };
        Ok(result.with_similarities(similarities))
    }

    /// Re-derive every embedding from the active relational rows.
    ///
    /// A single sweep proportional to the row count; returns the number of
    /// records written.
    pub async fn rebuild_all(&self) -> Result<usize> {
        let snapshot = self.db.snapshot().await?;
        self.embeddings.rebuild_all(&snapshot).await
    }

    /// Delete every embedding. Relational tables are left to the caller.
    pub async fn reset_all(&self) -> Result<()> {
        self.embeddings.clear().await?;
        Ok(())
    }

    /// One answer call. The outer result carries serialization failures;
    /// the inner one the LLM outcome, already mapped to a generation error.
    async fn generate(
        &self,
        context: &RetrievedContext,
        question: &str,
    ) -> Result<std::result::Result<String, Error>> {
        let prompt = answer_prompt(&context.to_prompt_json()?, question);
        let request = CompletionRequest::prompt(prompt)
            .with_system_prompt(ANSWER_INSTRUCTIONS)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        Ok(match self.llm.complete(request).await {
            Ok(response) => Ok(response.content),
            Err(e) => {
                log::warn!("answer generation failed: {e}");
                Err(Error::generation(e.to_string()))
            }
        })
    }
}

impl std::fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerGenerator")
            .field("llm", &self.llm.name())
            .field("embeddings", &self.embeddings)
            .field("top_k", &self.top_k)
            .finish()
    }
}

fn answer_prompt(context_json: &str, question: &str) -> String {
    format!("Context:\n{context_json}\n\nQuestion: {question}")
}
