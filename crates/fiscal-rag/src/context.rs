//! Context assembly: from ranked entity references to a prompt segment.

use fiscal_core::model::{Classification, EntityKind, Movement, Person, RelationalSnapshot};
use fiscal_core::Result;
use fiscal_store::Database;
use fiscal_vector::SimilarityResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Relational records grouped by entity family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Resolved persons.
    pub persons: Vec<Person>,
    /// Resolved classifications.
    pub classifications: Vec<Classification>,
    /// Resolved movements, with installments and classification ids.
    pub movements: Vec<Movement>,
}

impl RetrievedContext {
    /// Total number of records.
    pub fn len(&self) -> usize {
        self.persons.len() + self.classifications.len() + self.movements.len()
    }

    /// True when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pretty JSON used as the context block of a prompt.
    pub fn to_prompt_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Re-hydrates entity references against the relational store.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    db: Database,
}

impl ContextAssembler {
    /// Create an assembler reading from `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve each result to its current relational record.
    ///
    /// References whose row is gone or INACTIVE are dropped. Repeated
    /// references to the same entity (stale embeddings left by
    /// append-only writes) resolve once, at their best-ranked position.
    pub async fn assemble(&self, results: &[SimilarityResult]) -> Result<RetrievedContext> {
        let mut context = RetrievedContext::default();
        let mut seen = HashSet::new();

        for result in results {
            let key = (result.entity_kind, result.entity_id);
            if !seen.insert(key) {
                continue;
            }

            let id = result.entity_id;
            let resolved = match result.entity_kind {
                EntityKind::Person => match skip_missing(self.db.get_person(id).await)? {
                    Some(person) => {
                        context.persons.push(person);
                        true
                    }
                    None => false,
                },
                EntityKind::Classification => {
                    match skip_missing(self.db.get_classification(id).await)? {
                        Some(classification) => {
                            context.classifications.push(classification);
                            true
                        }
                        None => false,
                    }
                }
                EntityKind::Movement => match skip_missing(self.db.get_movement(id).await)? {
                    Some(movement) => {
                        context.movements.push(movement);
                        true
                    }
                    None => false,
                },
            };

            if !resolved {
                log::debug!("skipping unresolved {} {id}", result.entity_kind);
            }
        }

        Ok(context)
    }

    /// Every row of `snapshot`, unfiltered.
    ///
    /// The result grows linearly with the dataset.
    pub fn assemble_full(&self, snapshot: RelationalSnapshot) -> RetrievedContext {
        RetrievedContext {
            persons: snapshot.persons,
            classifications: snapshot.classifications,
            movements: snapshot.movements,
        }
    }
}

/// Fold a `NotFound` error into `None`; other errors pass through.
fn skip_missing<T>(found: Result<Option<T>>) -> Result<Option<T>> {
    match found {
        Err(e) if e.is_not_found() => Ok(None),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fiscal_core::model::PersonKind;
    use fiscal_core::Error;
    use fiscal_store::NewPerson;

    fn result(kind: EntityKind, entity_id: i64) -> SimilarityResult {
        SimilarityResult {
            embedding_id: entity_id,
            entity_kind: kind,
            entity_id,
            source_text: String::new(),
            score: 0.5,
        }
    }

    #[tokio::test]
    async fn test_assemble_groups_by_kind() {
        let db = Database::in_memory().await.unwrap();
        let supplier = db
            .insert_person(&NewPerson::new(PersonKind::Supplier, "Agro Sul").with_tax_id("111"))
            .await
            .unwrap();
        let assembler = ContextAssembler::new(db);

        let context = assembler
            .assemble(&[result(EntityKind::Person, supplier)])
            .await
            .unwrap();
        assert_eq!(context.persons.len(), 1);
        assert_eq!(context.persons[0].tax_id.as_deref(), Some("111"));
        assert!(context.classifications.is_empty());
        assert!(context.movements.is_empty());
    }

    #[tokio::test]
    async fn test_assemble_drops_missing_and_inactive() {
        let db = Database::in_memory().await.unwrap();
        let gone = db
            .insert_person(&NewPerson::new(PersonKind::BilledTo, "Maria"))
            .await
            .unwrap();
        db.deactivate_person(gone).await.unwrap();
        let assembler = ContextAssembler::new(db);

        let context = assembler
            .assemble(&[
                result(EntityKind::Person, gone),
                result(EntityKind::Movement, 404),
                result(EntityKind::Classification, 405),
            ])
            .await
            .unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_assemble_deduplicates_references() {
        let db = Database::in_memory().await.unwrap();
        let id = db
            .insert_person(&NewPerson::new(PersonKind::Supplier, "Agro Sul"))
            .await
            .unwrap();
        let assembler = ContextAssembler::new(db);

        let context = assembler
            .assemble(&[result(EntityKind::Person, id), result(EntityKind::Person, id)])
            .await
            .unwrap();
        assert_eq!(context.len(), 1);
    }

    #[tokio::test]
    async fn test_assemble_full_keeps_everything() {
        let db = Database::in_memory().await.unwrap();
        db.insert_person(&NewPerson::new(PersonKind::Supplier, "A"))
            .await
            .unwrap();
        db.insert_person(&NewPerson::new(PersonKind::Supplier, "B"))
            .await
            .unwrap();
        let snapshot = db.snapshot().await.unwrap();
        let assembler = ContextAssembler::new(db);

        let context = assembler.assemble_full(snapshot);
        assert_eq!(context.persons.len(), 2);
        let json = context.to_prompt_json().unwrap();
        assert!(json.contains("\"persons\""));
        assert!(json.contains("\"movements\": []"));
    }

    #[test]
    fn test_skip_missing() {
        assert_eq!(
            skip_missing::<i32>(Err(Error::not_found("person 1"))).unwrap(),
            None
        );
        assert_eq!(skip_missing(Ok(Some(3))).unwrap(), Some(3));
        assert!(skip_missing::<i32>(Err(Error::invalid_data("x"))).is_err());
    }
}
