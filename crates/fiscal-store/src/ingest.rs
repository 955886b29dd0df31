//! Atomic persistence of an extracted invoice.

use fiscal_core::invoice::Invoice;
use fiscal_core::model::{ClassificationKind, EntityKind, MovementKind, PersonKind};
use fiscal_core::{Error, Result};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::movements::{NewInstallment, NewMovement};
use crate::persons::NewPerson;
use crate::{Database, classifications, movements, persons};

/// Ids touched by one invoice, and which of them were newly created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistOutcome {
    /// The new movement.
    pub movement_id: i64,
    /// Supplier person (existing or new).
    pub supplier_id: i64,
    /// Billed-to person (existing or new).
    pub billed_to_id: i64,
    /// Linked classifications (existing or new).
    pub classification_ids: Vec<i64>,
    /// Entities inserted by this call, movement last.
    pub created: Vec<(EntityKind, i64)>,
}

impl Database {
    /// Persist an invoice as persons, classifications, a movement, its
    /// installments, and classification links.
    ///
    /// Persons are matched by role and document number (or by role and name
    /// when the invoice has no document), classifications by description.
    /// Everything runs in one transaction: either all rows commit or none do.
    pub async fn persist_invoice(&self, invoice: &Invoice) -> Result<PersistOutcome> {
        let supplier = supplier_of(invoice)?;
        let billed_to = billed_to_of(invoice)?;

        let mut tx = self.pool().begin().await?;
        let mut created = Vec::new();

        let supplier_id = find_or_create_person(&mut tx, &supplier, &mut created).await?;
        let billed_to_id = find_or_create_person(&mut tx, &billed_to, &mut created).await?;

        let mut classification_ids = Vec::new();
        for category in &invoice.expense_categories {
            let description = category.trim().to_uppercase();
            if description.is_empty() {
                continue;
            }
            let id = match classifications::find_by_description(
                &mut tx,
                ClassificationKind::Expense,
                &description,
            )
            .await?
            {
                Some(existing) => existing.id,
                None => {
                    let id =
                        classifications::insert(&mut tx, ClassificationKind::Expense, &description)
                            .await?;
                    created.push((EntityKind::Classification, id));
                    id
                }
            };
            if !classification_ids.contains(&id) {
                classification_ids.push(id);
            }
        }

        let movement = NewMovement {
            kind: MovementKind::Payable,
            invoice_number: invoice.number.clone(),
            issue_date: invoice.issue_date,
            description: movement_description(invoice),
            total_amount: invoice.total_amount,
            supplier_id,
            billed_to_id,
            installments: installments_of(invoice),
            classification_ids: classification_ids.clone(),
        };
        let movement_id = movements::insert(&mut tx, &movement).await?;
        created.push((EntityKind::Movement, movement_id));

        tx.commit().await?;
        log::info!(
            "persisted invoice {} as movement {movement_id} ({} new entities)",
            invoice.number.as_deref().unwrap_or("?"),
            created.len()
        );

        Ok(PersistOutcome {
            movement_id,
            supplier_id,
            billed_to_id,
            classification_ids,
            created,
        })
    }
}

async fn find_or_create_person(
    conn: &mut SqliteConnection,
    person: &NewPerson,
    created: &mut Vec<(EntityKind, i64)>,
) -> Result<i64> {
    let existing = match person.tax_id.as_deref() {
        Some(tax_id) => persons::find_by_tax_id(conn, person.kind, tax_id).await?,
        None => persons::find_by_name(conn, person.kind, &person.legal_name).await?,
    };
    if let Some(existing) = existing {
        return Ok(existing.id);
    }
    let id = persons::insert(conn, person).await?;
    created.push((EntityKind::Person, id));
    Ok(id)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn supplier_of(invoice: &Invoice) -> Result<NewPerson> {
    let tax_id = non_empty(invoice.supplier.tax_id.as_deref());
    let name = non_empty(Some(&invoice.supplier.legal_name))
        .or_else(|| tax_id.clone())
        .ok_or_else(|| Error::invalid_data("invoice has neither supplier name nor document"))?;
    Ok(NewPerson {
        kind: PersonKind::Supplier,
        legal_name: name,
        trade_name: non_empty(invoice.supplier.trade_name.as_deref()),
        tax_id,
    })
}

fn billed_to_of(invoice: &Invoice) -> Result<NewPerson> {
    let tax_id = non_empty(invoice.billed_to.tax_id.as_deref());
    let name = non_empty(Some(&invoice.billed_to.full_name))
        .or_else(|| tax_id.clone())
        .ok_or_else(|| Error::invalid_data("invoice has neither billed-to name nor document"))?;
    Ok(NewPerson {
        kind: PersonKind::BilledTo,
        legal_name: name,
        trade_name: None,
        tax_id,
    })
}

fn movement_description(invoice: &Invoice) -> String {
    let items = invoice.items_description();
    if items.is_empty() {
        format!("Invoice {}", invoice.number.as_deref().unwrap_or("without number"))
    } else {
        items
    }
}

/// The invoice's schedule, or a single installment for the whole amount
/// due on the issue date when the invoice lists none.
fn installments_of(invoice: &Invoice) -> Vec<NewInstallment> {
    let count = invoice.installments.len();
    if count == 0 {
        return vec![NewInstallment {
            label: "1/1".to_string(),
            due_date: invoice.issue_date,
            amount: invoice.total_amount,
        }];
    }
    invoice
        .installments
        .iter()
        .map(|i| NewInstallment {
            label: format!("{}/{count}", i.index),
            due_date: i.due_date,
            amount: i.amount,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fiscal_core::invoice::{BilledTo, InvoiceInstallment, LineItem, Supplier};

    fn invoice(number: &str, supplier_doc: &str) -> Invoice {
        Invoice {
            number: Some(number.to_string()),
            series: Some("1".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            supplier: Supplier {
                legal_name: "Posto Central LTDA".to_string(),
                trade_name: Some("Posto Central".to_string()),
                tax_id: Some(supplier_doc.to_string()),
            },
            billed_to: BilledTo {
                full_name: "João da Silva".to_string(),
                tax_id: None,
            },
            line_items: vec![LineItem {
                description: "Óleo diesel S10".to_string(),
                quantity: Some("200".to_string()),
            }],
            installments: vec![
                InvoiceInstallment {
                    index: 1,
                    due_date: NaiveDate::from_ymd_opt(2025, 5, 1),
                    amount: 500.0,
                },
                InvoiceInstallment {
                    index: 2,
                    due_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                    amount: 500.0,
                },
            ],
            total_amount: 1000.0,
            expense_categories: ["Manutenção e Operação".to_string()].into(),
        }
    }

    #[tokio::test]
    async fn test_persist_invoice_creates_everything() {
        let db = Database::in_memory().await.unwrap();
        let outcome = db.persist_invoice(&invoice("10", "11.111")).await.unwrap();

        assert_eq!(outcome.created.len(), 4);
        assert_eq!(
            outcome.created.last(),
            Some(&(EntityKind::Movement, outcome.movement_id))
        );

        let movement = db.get_movement(outcome.movement_id).await.unwrap().unwrap();
        assert_eq!(movement.description, "Óleo diesel S10");
        assert_eq!(movement.installments.len(), 2);
        assert_eq!(movement.installments[1].label, "2/2");
        assert_eq!(movement.classification_ids, outcome.classification_ids);

        let class = db
            .get_classification(outcome.classification_ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(class.description, "MANUTENÇÃO E OPERAÇÃO");
    }

    #[tokio::test]
    async fn test_persist_invoice_reuses_known_entities() {
        let db = Database::in_memory().await.unwrap();
        let first = db.persist_invoice(&invoice("10", "11.111")).await.unwrap();
        let second = db.persist_invoice(&invoice("11", "11.111")).await.unwrap();

        assert_eq!(first.supplier_id, second.supplier_id);
        assert_eq!(first.billed_to_id, second.billed_to_id);
        assert_eq!(first.classification_ids, second.classification_ids);
        assert_eq!(second.created, vec![(EntityKind::Movement, second.movement_id)]);
        assert_eq!(db.list_persons().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_billed_to_sharing_supplier_document_gets_own_row() {
        use fiscal_core::model::Embeddable;

        let db = Database::in_memory().await.unwrap();
        let first = db.persist_invoice(&invoice("20", "55.555")).await.unwrap();

        let mut inv = invoice("21", "66.666");
        inv.billed_to.full_name = "Posto Central LTDA".to_string();
        inv.billed_to.tax_id = Some("55.555".to_string());
        let second = db.persist_invoice(&inv).await.unwrap();

        assert_ne!(second.billed_to_id, first.supplier_id);
        let billed_to = db.get_person(second.billed_to_id).await.unwrap().unwrap();
        assert_eq!(billed_to.kind, PersonKind::BilledTo);
        assert_eq!(
            billed_to.source_text(),
            "Person BILLED_TO: Posto Central LTDA, Document: 55.555"
        );

        let supplier = db.get_person(first.supplier_id).await.unwrap().unwrap();
        assert_eq!(supplier.kind, PersonKind::Supplier);
    }

    #[tokio::test]
    async fn test_persist_invoice_without_installments() {
        let db = Database::in_memory().await.unwrap();
        let mut inv = invoice("12", "22.222");
        inv.installments.clear();
        let outcome = db.persist_invoice(&inv).await.unwrap();

        let movement = db.get_movement(outcome.movement_id).await.unwrap().unwrap();
        assert_eq!(movement.installments.len(), 1);
        assert_eq!(movement.installments[0].label, "1/1");
        assert_eq!(movement.installments[0].amount, 1000.0);
        assert_eq!(movement.installments[0].due_date, inv.issue_date);
    }

    #[tokio::test]
    async fn test_persist_invoice_rejects_anonymous_supplier() {
        let db = Database::in_memory().await.unwrap();
        let mut inv = invoice("13", "");
        inv.supplier.legal_name = "  ".to_string();

        let err = db.persist_invoice(&inv).await.unwrap_err();
        assert!(err.to_string().contains("supplier"));
        assert!(db.snapshot().await.unwrap().is_empty());
    }

    #[test]
    fn test_movement_description_fallback() {
        let mut inv = invoice("99", "1");
        inv.line_items.clear();
        assert_eq!(movement_description(&inv), "Invoice 99");
    }
}
