//! The ingestion pipeline: extract, persist, embed.

use fiscal_core::invoice::Invoice;
use fiscal_core::model::{Embeddable, EntityKind};
use fiscal_core::Result;
use fiscal_store::{Database, PersistOutcome};
use fiscal_vector::EntityEmbeddingStore;
use serde::Serialize;

use crate::extractor::InvoiceExtractor;

/// Everything one ingested invoice produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// The extracted invoice.
    pub invoice: Invoice,
    /// Relational ids, including which entities were created.
    pub outcome: PersistOutcome,
    /// Embedding ids written for the created entities.
    pub embedding_ids: Vec<i64>,
}

/// Feeds invoices into the relational and embedding stores.
pub struct Ingestor {
    extractor: InvoiceExtractor,
    db: Database,
    embeddings: EntityEmbeddingStore,
}

impl Ingestor {
    /// Create a pipeline over the given components.
    pub fn new(extractor: InvoiceExtractor, db: Database, embeddings: EntityEmbeddingStore) -> Self {
        Self {
            extractor,
            db,
            embeddings,
        }
    }

    /// The extractor, for listing categories.
    pub fn extractor(&self) -> &InvoiceExtractor {
        &self.extractor
    }

    /// Extract `document_text`, persist it atomically, then embed every
    /// entity the invoice created.
    ///
    /// Embedding runs after the relational commit. If it fails, the
    /// invoice stays stored and `rebuild` restores the missing embeddings.
    pub async fn ingest_text(&self, document_text: &str) -> Result<IngestReport> {
        let invoice = self.extractor.extract(document_text).await?;
        let outcome = self.db.persist_invoice(&invoice).await?;

        let mut embedding_ids = Vec::with_capacity(outcome.created.len());
        for &(kind, id) in &outcome.created {
            let Some(text) = self.source_text(kind, id).await? else {
                continue;
            };
            match self.embeddings.put(kind, id, &text).await {
                Ok(embedding_id) => embedding_ids.push(embedding_id),
                Err(e) => {
                    log::warn!("embedding {kind} {id} failed, run rebuild to repair: {e}");
                    return Err(e);
                }
            }
        }

        log::info!(
            "ingested movement {} with {} new embeddings",
            outcome.movement_id,
            embedding_ids.len()
        );
        Ok(IngestReport {
            invoice,
            outcome,
            embedding_ids,
        })
    }

    async fn source_text(&self, kind: EntityKind, id: i64) -> Result<Option<String>> {
        Ok(match kind {
            EntityKind::Person => self.db.get_person(id).await?.map(|p| p.source_text()),
            EntityKind::Classification => self
                .db
                .get_classification(id)
                .await?
                .map(|c| c.source_text()),
            EntityKind::Movement => self.db.get_movement(id).await?.map(|m| m.source_text()),
        })
    }
}
