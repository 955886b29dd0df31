//! Raw row types and their conversion into domain records.

use chrono::NaiveDate;
use fiscal_core::Result;
use fiscal_core::model::{Classification, Installment, Movement, Person};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct PersonRow {
    pub id: i64,
    pub kind: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub tax_id: Option<String>,
    pub status: String,
}

impl TryFrom<PersonRow> for Person {
    type Error = fiscal_core::Error;

    fn try_from(row: PersonRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            kind: row.kind.parse()?,
            legal_name: row.legal_name,
            trade_name: row.trade_name,
            tax_id: row.tax_id,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ClassificationRow {
    pub id: i64,
    pub kind: String,
    pub description: String,
    pub status: String,
}

impl TryFrom<ClassificationRow> for Classification {
    type Error = fiscal_core::Error;

    fn try_from(row: ClassificationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            kind: row.kind.parse()?,
            description: row.description,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct InstallmentRow {
    pub id: i64,
    pub label: String,
    pub due_date: Option<NaiveDate>,
    pub amount: f64,
    pub paid_amount: f64,
    pub balance: f64,
    pub status: String,
    pub movement_id: i64,
}

impl TryFrom<InstallmentRow> for Installment {
    type Error = fiscal_core::Error;

    fn try_from(row: InstallmentRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            label: row.label,
            due_date: row.due_date,
            amount: row.amount,
            paid_amount: row.paid_amount,
            balance: row.balance,
            status: row.status.parse()?,
            movement_id: row.movement_id,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MovementRow {
    pub id: i64,
    pub kind: String,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub description: String,
    pub total_amount: f64,
    pub supplier_id: i64,
    pub billed_to_id: i64,
    pub status: String,
}

impl MovementRow {
    /// Converts the bare row; installments and links are attached later.
    pub fn into_movement(self) -> Result<Movement> {
        Ok(Movement {
            id: self.id,
            kind: self.kind.parse()?,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            description: self.description,
            total_amount: self.total_amount,
            supplier_id: self.supplier_id,
            billed_to_id: self.billed_to_id,
            status: self.status.parse()?,
            installments: Vec::new(),
            classification_ids: Vec::new(),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LinkRow {
    pub movement_id: i64,
    pub classification_id: i64,
}

pub(crate) const PERSON_COLUMNS: &str = "id, kind, legal_name, trade_name, tax_id, status";
pub(crate) const CLASSIFICATION_COLUMNS: &str = "id, kind, description, status";
pub(crate) const MOVEMENT_COLUMNS: &str = "id, kind, invoice_number, issue_date, description, \
     total_amount, supplier_id, billed_to_id, status";
pub(crate) const INSTALLMENT_COLUMNS: &str =
    "id, label, due_date, amount, paid_amount, balance, status, movement_id";
