//! Cosine similarity and top-k ranking.

use fiscal_core::{Error, Result};

use crate::types::{EmbeddingRecord, SimilarityResult};

/// Cosine similarity of two equal-length vectors, clamped to [-1, 1].
///
/// Accumulates in `f64`. Returns 0.0 when either vector has zero norm or
/// the lengths differ; [`rank`] checks lengths before calling this.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Rank `candidates` against `query`, best first, keeping at most `k`.
///
/// Ties keep candidate order. Any candidate whose length differs from the
/// query's is a [`Error::MalformedVector`].
pub fn rank(
    query: &[f32],
    candidates: &[EmbeddingRecord],
    k: usize,
) -> Result<Vec<SimilarityResult>> {
    let mut scored = Vec::with_capacity(candidates.len());
    for record in candidates {
        if record.vector.len() != query.len() {
            return Err(Error::MalformedVector {
                expected: query.len(),
                actual: record.vector.len(),
            });
        }
        scored.push(SimilarityResult {
            embedding_id: record.id,
            entity_kind: record.entity_kind,
            entity_id: record.entity_id,
            source_text: record.source_text.clone(),
            score: cosine_similarity(query, &record.vector),
        });
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    Ok(scored)
}
