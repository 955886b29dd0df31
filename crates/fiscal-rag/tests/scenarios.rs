//! End-to-end retrieval scenarios over an in-memory database, using the
//! deterministic bag-of-words encoder.

#![allow(clippy::unwrap_used)]

use fiscal_core::config::EmbeddingConfig;
use fiscal_core::llm::MockLlmProvider;
use fiscal_core::model::{EntityKind, PersonKind};
use fiscal_core::Error;
use fiscal_rag::{AnswerGenerator, ContextAssembler};
use fiscal_store::{Database, NewPerson};
use fiscal_vector::{BagOfWordsEncoder, EntityEmbeddingStore, VectorEncoder, rank};
use std::sync::Arc;

const DIMENSION: usize = 128;

struct Fixture {
    db: Database,
    embeddings: EntityEmbeddingStore,
    llm: MockLlmProvider,
    generator: AnswerGenerator,
}

async fn fixture() -> Fixture {
    let db = Database::in_memory().await.unwrap();
    let encoder: Arc<dyn VectorEncoder> = Arc::new(BagOfWordsEncoder::new(DIMENSION));
    let embeddings = EntityEmbeddingStore::new(db.pool().clone(), encoder)
        .await
        .unwrap();
    let llm = MockLlmProvider::with_response("answer");
    let generator = AnswerGenerator::new(
        db.clone(),
        embeddings.clone(),
        Arc::new(llm.clone()),
        &EmbeddingConfig::default(),
    );
    Fixture {
        db,
        embeddings,
        llm,
        generator,
    }
}

async fn seed_three_persons(db: &Database) {
    for (name, tax_id) in [("Agro Sul", "111"), ("Maria Souza", "222"), ("Posto Rota", "333")] {
        db.insert_person(&NewPerson::new(PersonKind::Supplier, name).with_tax_id(tax_id))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn question_by_document_resolves_that_person_once() {
    let f = fixture().await;
    seed_three_persons(&f.db).await;
    assert_eq!(f.generator.rebuild_all().await.unwrap(), 3);

    let query = f.embeddings.encoder().encode("quem é 222").await;
    let records = f.embeddings.scan_all().await.unwrap();

    let all = rank(&query, &records, records.len()).unwrap();
    assert!(all[0].source_text.ends_with("Document: 222"));
    assert!(all[0].score > all[1].score);

    let ranked = rank(&query, &records, 1).unwrap();
    let context = ContextAssembler::new(f.db.clone())
        .assemble(&ranked)
        .await
        .unwrap();

    assert_eq!(context.persons.len(), 1);
    assert_eq!(context.persons[0].tax_id.as_deref(), Some("222"));
    assert_eq!(context.persons[0].legal_name, "Maria Souza");
}

#[tokio::test]
async fn rebuild_with_no_rows_leaves_store_empty() {
    let f = fixture().await;
    assert_eq!(f.generator.rebuild_all().await.unwrap(), 0);
    assert!(f.embeddings.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn embeddings_answer_on_empty_store_does_not_call_llm() {
    let f = fixture().await;
    seed_three_persons(&f.db).await;

    let result = f.generator.answer_with_embeddings("quem é 222").await.unwrap();
    assert!(!result.success);
    assert_eq!(
        result.error_message.unwrap(),
        Error::NoEmbeddings.to_string()
    );
    assert_eq!(f.llm.calls().await, 0);
}

#[tokio::test]
async fn reset_twice_leaves_store_empty() {
    let f = fixture().await;
    seed_three_persons(&f.db).await;
    f.generator.rebuild_all().await.unwrap();

    f.generator.reset_all().await.unwrap();
    assert!(f.embeddings.scan_all().await.unwrap().is_empty());
    f.generator.reset_all().await.unwrap();
    assert!(f.embeddings.scan_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn resolved_context_only_holds_live_entities() {
    let f = fixture().await;
    seed_three_persons(&f.db).await;
    f.generator.rebuild_all().await.unwrap();

    let victim = f
        .db
        .find_person_by_tax_id(PersonKind::Supplier, "333")
        .await
        .unwrap()
        .unwrap();
    assert!(f.db.deactivate_person(victim.id).await.unwrap());
    f.embeddings
        .put(EntityKind::Movement, 9999, "Movement invoice 1, date N/A")
        .await
        .unwrap();

    let query = f.embeddings.encoder().encode("Document 333").await;
    let ranked = rank(&query, &f.embeddings.scan_all().await.unwrap(), 5).unwrap();
    assert_eq!(ranked.len(), 4);

    let context = ContextAssembler::new(f.db.clone())
        .assemble(&ranked)
        .await
        .unwrap();
    let snapshot = f.db.snapshot().await.unwrap();

    assert_eq!(context.persons.len(), 2);
    assert!(context.movements.is_empty());
    for person in &context.persons {
        assert!(snapshot.persons.iter().any(|p| p.id == person.id));
    }
}

#[tokio::test]
async fn embeddings_answer_reports_top_five() {
    let f = fixture().await;
    for i in 0..7 {
        f.db.insert_person(
            &NewPerson::new(PersonKind::Supplier, format!("Supplier {i}"))
                .with_tax_id(format!("{i}{i}{i}")),
        )
        .await
        .unwrap();
    }
    f.generator.rebuild_all().await.unwrap();

    let result = f
        .generator
        .answer_with_embeddings("Supplier 444")
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.answer_text.as_deref(), Some("answer"));
    assert_eq!(result.similarities.unwrap().len(), 5);
    assert_eq!(f.llm.calls().await, 1);
}
