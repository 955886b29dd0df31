//! Persistent embedding store.
//!
//! Embeddings live in one `embeddings` table next to the relational tables,
//! with vectors packed as little-endian `f32` blobs. The table holds weak
//! references only: deleting or deactivating an entity never touches its
//! embeddings, and ids left behind are filtered out at resolution time.

use chrono::{DateTime, Utc};
use fiscal_core::model::{EntityKind, RelationalSnapshot};
use fiscal_core::{Error, Result};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use crate::encoder::VectorEncoder;
use crate::types::EmbeddingRecord;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS embeddings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_kind TEXT    NOT NULL,
    entity_id   INTEGER NOT NULL,
    source_text TEXT    NOT NULL,
    vector      BLOB    NOT NULL,
    created_at  TEXT    NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_embeddings_entity ON embeddings (entity_kind, entity_id)";

const INSERT: &str = "INSERT INTO embeddings (entity_kind, entity_id, source_text, vector, created_at) \
     VALUES (?, ?, ?, ?, ?)";

#[derive(Debug, FromRow)]
struct EmbeddingRow {
    id: i64,
    entity_kind: String,
    entity_id: i64,
    source_text: String,
    vector: Vec<u8>,
    created_at: DateTime<Utc>,
}

/// Pack a vector as little-endian `f32` bytes.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Unpack little-endian `f32` bytes; trailing partial values are an error.
pub fn bytes_to_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::invalid_data(format!(
            "embedding blob of {} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Store of `(entity, text, vector)` records.
///
/// Every record written by a store has exactly `encoder.dimension()`
/// values; reads reject records of any other length.
#[derive(Clone)]
pub struct EntityEmbeddingStore {
    pool: SqlitePool,
    encoder: Arc<dyn VectorEncoder>,
}

impl EntityEmbeddingStore {
    /// Create a store over `pool`, bootstrapping the table if needed.
    pub async fn new(pool: SqlitePool, encoder: Arc<dyn VectorEncoder>) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        sqlx::query(CREATE_INDEX).execute(&mut *conn).await?;
        drop(conn);
        log::debug!(
            "embedding store ready (encoder={}, dimension={})",
            encoder.name(),
            encoder.dimension()
        );
        Ok(Self { pool, encoder })
    }

    /// The fixed vector dimension.
    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// The encoder used for both stored texts and queries.
    pub fn encoder(&self) -> &Arc<dyn VectorEncoder> {
        &self.encoder
    }

    /// Encode `source_text` and append one record. Returns the new id.
    pub async fn put(&self, kind: EntityKind, entity_id: i64, source_text: &str) -> Result<i64> {
        let vector = self.encoder.encode(source_text).await;
        self.check_dimension(vector.len())?;

        let id = sqlx::query(INSERT)
            .bind(kind.as_str())
            .bind(entity_id)
            .bind(source_text)
            .bind(vector_to_bytes(&vector))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        log::debug!("stored embedding {id} for {kind} {entity_id}");
        Ok(id)
    }

    /// Every stored record, in id order.
    pub async fn scan_all(&self) -> Result<Vec<EmbeddingRecord>> {
        let rows: Vec<EmbeddingRow> = sqlx::query_as(
            "SELECT id, entity_kind, entity_id, source_text, vector, created_at \
             FROM embeddings ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM embeddings")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Delete every record. Safe to call on an empty store.
    pub async fn clear(&self) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM embeddings")
            .execute(&self.pool)
            .await?
            .rows_affected();
        log::info!("cleared {removed} embeddings");
        Ok(removed)
    }

    /// Replace the whole store with one record per entity in `snapshot`.
    ///
    /// All vectors are computed before the table is touched, and the
    /// delete plus inserts commit as one transaction, so a failure leaves
    /// the previous contents in place. Returns the number of records.
    pub async fn rebuild_all(&self, snapshot: &RelationalSnapshot) -> Result<usize> {
        let sources: Vec<(EntityKind, i64, String)> = snapshot
            .embeddables()
            .into_iter()
            .map(|e| (e.entity_kind(), e.entity_id(), e.source_text()))
            .collect();

        let mut encoded = Vec::with_capacity(sources.len());
        for (kind, entity_id, text) in sources {
            let vector = self.encoder.encode(&text).await;
            self.check_dimension(vector.len())?;
            encoded.push((kind, entity_id, text, vector));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM embeddings").execute(&mut *tx).await?;
        for (kind, entity_id, text, vector) in &encoded {
            sqlx::query(INSERT)
                .bind(kind.as_str())
                .bind(entity_id)
                .bind(text)
                .bind(vector_to_bytes(vector))
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        log::info!("rebuilt {} embeddings", encoded.len());
        Ok(encoded.len())
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        let expected = self.dimension();
        if actual != expected {
            return Err(Error::MalformedVector { expected, actual });
        }
        Ok(())
    }

    fn decode(&self, row: EmbeddingRow) -> Result<EmbeddingRecord> {
        let vector = bytes_to_vector(&row.vector)?;
        self.check_dimension(vector.len())?;
        Ok(EmbeddingRecord {
            id: row.id,
            entity_kind: row.entity_kind.parse()?,
            entity_id: row.entity_id,
            source_text: row.source_text,
            vector,
            created_at: row.created_at,
        })
    }
}

impl std::fmt::Debug for EntityEmbeddingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityEmbeddingStore")
            .field("encoder", &self.encoder.name())
            .field("dimension", &self.dimension())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
