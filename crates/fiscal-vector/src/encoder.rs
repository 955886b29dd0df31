//! Vector encoders.
//!
//! This module defines the `VectorEncoder` trait that turns text into a
//! fixed-length vector. Similarity ranking and context assembly only see the
//! trait, so a real embedding model can replace these encoders later.
//!
//! # Encoders
//!
//! - `BagOfWordsEncoder`: pure, deterministic hashed word-frequency vector
//! - `LlmDigestEncoder`: asks the LLM for a condensation and expands a
//!   BLAKE3 digest of it into the vector; falls back to bag-of-words when
//!   the LLM call fails

use async_trait::async_trait;
use fiscal_core::llm::{CompletionRequest, LlmProvider};
use std::sync::Arc;

/// Trait for turning text into a vector of exactly `dimension()` floats.
///
/// Encoding is total: implementations must produce a vector for every
/// input, degrading to a local strategy instead of failing.
#[async_trait]
pub trait VectorEncoder: Send + Sync {
    /// Encode one text.
    async fn encode(&self, text: &str) -> Vec<f32>;

    /// The vector dimension.
    fn dimension(&self) -> usize;

    /// The encoder name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Bag of words
// ============================================================================

/// Hashed word-frequency encoder.
///
/// Each token lands in the slot given by its BLAKE3 hash modulo `dimension`,
/// so a word occupies the same slot in every text and texts sharing words
/// overlap. Distinct tokens may share a slot.
#[derive(Debug, Clone)]
pub struct BagOfWordsEncoder {
    dimension: usize,
}

impl BagOfWordsEncoder {
    /// Create an encoder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Synchronous encoding; identical input always yields identical output.
    pub fn encode_text(&self, text: &str) -> Vec<f32> {
        bag_of_words(text, self.dimension)
    }
}

/// Lower-cased whitespace tokens with surrounding punctuation removed.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
}

/// Slot of `token` in a vector of `dimension` values.
///
/// The first eight bytes of the token's BLAKE3 hash, read little-endian,
/// modulo `dimension`. `dimension` must be non-zero.
pub fn token_slot(token: &str, dimension: usize) -> usize {
    let hash = blake3::hash(token.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(head) % dimension as u64) as usize
}

fn bag_of_words(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    if dimension == 0 {
        return vector;
    }

    for token in tokenize(text) {
        vector[token_slot(&token, dimension)] += 1.0;
    }
    vector
}

#[async_trait]
impl VectorEncoder for BagOfWordsEncoder {
    async fn encode(&self, text: &str) -> Vec<f32> {
        self.encode_text(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

// ============================================================================
// LLM digest
// ============================================================================

const SUMMARY_INSTRUCTIONS: &str = "Condense the following text into one short sentence. \
     Keep every name, document number, date, and amount. Reply with the sentence only.";

/// Encoder that hashes an LLM-written condensation of the text.
///
/// Two calls with the same text may yield different vectors, because the
/// condensation is not deterministic. Vectors are only compared within a
/// single query, so this is acceptable.
pub struct LlmDigestEncoder {
    llm: Arc<dyn LlmProvider>,
    fallback: BagOfWordsEncoder,
    summary_max_tokens: u32,
}

impl LlmDigestEncoder {
    /// Create an encoder backed by `llm`.
    pub fn new(llm: Arc<dyn LlmProvider>, dimension: usize) -> Self {
        Self {
            llm,
            fallback: BagOfWordsEncoder::new(dimension),
            summary_max_tokens: 256,
        }
    }

    /// Set the token budget for the condensation.
    pub fn with_summary_max_tokens(mut self, max_tokens: u32) -> Self {
        self.summary_max_tokens = max_tokens;
        self
    }
}

/// Expand a BLAKE3 digest of `text` into `dimension` values in [0, 1].
///
/// Value `i` is byte `i` of the extendable digest output divided by 255.
pub fn digest_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut bytes = vec![0u8; dimension];
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.finalize_xof().fill(&mut bytes);
    bytes.into_iter().map(|b| f32::from(b) / 255.0).collect()
}

#[async_trait]
impl VectorEncoder for LlmDigestEncoder {
    async fn encode(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return self.fallback.encode_text(text);
        }

        let request = CompletionRequest::prompt(text)
            .with_system_prompt(SUMMARY_INSTRUCTIONS)
            .with_max_tokens(self.summary_max_tokens);

        match self.llm.complete(request).await {
            Ok(response) => digest_vector(response.content.trim(), self.dimension()),
            Err(e) => {
                log::warn!("condensation failed, using bag-of-words fallback: {e}");
                self.fallback.encode_text(text)
            }
        }
    }

    fn dimension(&self) -> usize {
        self.fallback.dimension
    }

    fn name(&self) -> &str {
        "llm-digest"
    }
}

// ============================================================================
// Tests
// ============================================================================
