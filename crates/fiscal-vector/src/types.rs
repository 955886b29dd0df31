//! Embedding records and similarity results.

use chrono::{DateTime, Utc};
use fiscal_core::model::EntityKind;
use serde::{Deserialize, Serialize};

/// One stored embedding of one entity.
///
/// Append-only: a changed entity keeps its stale record until the next
/// full rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Monotonic record id.
    pub id: i64,

    /// Entity family.
    pub entity_kind: EntityKind,

    /// Row id in the relational store (weak reference).
    pub entity_id: i64,

    /// The text that was embedded.
    pub source_text: String,

    /// The embedding vector.
    pub vector: Vec<f32>,

    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A ranked match for one query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Matched record id.
    pub embedding_id: i64,

    /// Entity family.
    pub entity_kind: EntityKind,

    /// Row id in the relational store.
    pub entity_id: i64,

    /// The text that was embedded.
    pub source_text: String,

    /// Cosine similarity in [-1, 1].
    pub score: f32,
}
