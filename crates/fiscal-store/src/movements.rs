//! Movement, installment, and link table access.

use chrono::NaiveDate;
use fiscal_core::model::{Installment, Movement, MovementKind};
use fiscal_core::Result;
use sqlx::SqliteConnection;
use std::collections::HashMap;

use crate::Database;
use crate::rows::{INSTALLMENT_COLUMNS, InstallmentRow, LinkRow, MOVEMENT_COLUMNS, MovementRow};

/// Fields of a movement about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    /// Direction.
    pub kind: MovementKind,
    /// Invoice number.
    pub invoice_number: Option<String>,
    /// Issue date.
    pub issue_date: Option<NaiveDate>,
    /// Description.
    pub description: String,
    /// Total amount.
    pub total_amount: f64,
    /// Supplier person id.
    pub supplier_id: i64,
    /// Billed-to person id.
    pub billed_to_id: i64,
    /// Payment schedule.
    pub installments: Vec<NewInstallment>,
    /// Classification ids to link.
    pub classification_ids: Vec<i64>,
}

/// Fields of an installment about to be inserted. New installments are
/// open, unpaid, and carry their whole amount as balance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstallment {
    /// Display label.
    pub label: String,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Amount due.
    pub amount: f64,
}

/// Inserts the movement, its installments, and its classification links.
///
/// Callers own the transaction; every statement runs on `conn`.
pub(crate) async fn insert(conn: &mut SqliteConnection, movement: &NewMovement) -> Result<i64> {
    let movement_id = sqlx::query(
        "INSERT INTO movements
            (kind, invoice_number, issue_date, description, total_amount,
             supplier_id, billed_to_id, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'ACTIVE')",
    )
    .bind(movement.kind.as_str())
    .bind(&movement.invoice_number)
    .bind(movement.issue_date)
    .bind(&movement.description)
    .bind(movement.total_amount)
    .bind(movement.supplier_id)
    .bind(movement.billed_to_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for installment in &movement.installments {
        sqlx::query(
            "INSERT INTO installments
                (label, due_date, amount, paid_amount, balance, status, movement_id)
             VALUES (?, ?, ?, 0, ?, 'OPEN', ?)",
        )
        .bind(&installment.label)
        .bind(installment.due_date)
        .bind(installment.amount)
        .bind(installment.amount)
        .bind(movement_id)
        .execute(&mut *conn)
        .await?;
    }

    for classification_id in &movement.classification_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO movement_classifications (movement_id, classification_id)
             VALUES (?, ?)",
        )
        .bind(movement_id)
        .bind(classification_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(movement_id)
}

pub(crate) async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Movement>> {
    let sql =
        format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ? AND status = 'ACTIVE'");
    let Some(row) = sqlx::query_as::<_, MovementRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    let mut movement = row.into_movement()?;

    let sql = format!("SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE movement_id = ? ORDER BY id");
    movement.installments = sqlx::query_as::<_, InstallmentRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Installment::try_from)
        .collect::<Result<_>>()?;

    movement.classification_ids = sqlx::query_as::<_, LinkRow>(
        "SELECT movement_id, classification_id FROM movement_classifications
         WHERE movement_id = ? ORDER BY classification_id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|link| link.classification_id)
    .collect();

    Ok(Some(movement))
}

/// Every active movement with installments and links attached.
pub(crate) async fn list(conn: &mut SqliteConnection) -> Result<Vec<Movement>> {
    let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE status = 'ACTIVE' ORDER BY id");
    let mut movements: Vec<Movement> = sqlx::query_as::<_, MovementRow>(&sql)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(MovementRow::into_movement)
        .collect::<Result<_>>()?;

    let sql = format!("SELECT {INSTALLMENT_COLUMNS} FROM installments ORDER BY id");
    let mut installments: HashMap<i64, Vec<Installment>> = HashMap::new();
    for row in sqlx::query_as::<_, InstallmentRow>(&sql)
        .fetch_all(&mut *conn)
        .await?
    {
        let installment = Installment::try_from(row)?;
        installments
            .entry(installment.movement_id)
            .or_default()
            .push(installment);
    }

    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
    for link in sqlx::query_as::<_, LinkRow>(
        "SELECT movement_id, classification_id FROM movement_classifications
         ORDER BY movement_id, classification_id",
    )
    .fetch_all(&mut *conn)
    .await?
    {
        links
            .entry(link.movement_id)
            .or_default()
            .push(link.classification_id);
    }

    for movement in &mut movements {
        movement.installments = installments.remove(&movement.id).unwrap_or_default();
        movement.classification_ids = links.remove(&movement.id).unwrap_or_default();
    }
    Ok(movements)
}

impl Database {
    /// Atomically insert a movement with its installments and links.
    pub async fn insert_movement(&self, movement: &NewMovement) -> Result<i64> {
        let mut tx = self.pool().begin().await?;
        let id = insert(&mut tx, movement).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// The active movement with this id, with installments and links.
    pub async fn get_movement(&self, id: i64) -> Result<Option<Movement>> {
        let mut conn = self.pool().acquire().await?;
        get(&mut conn, id).await
    }

    /// Every active movement, ordered by id.
    pub async fn list_movements(&self) -> Result<Vec<Movement>> {
        let mut conn = self.pool().acquire().await?;
        list(&mut conn).await
    }

    /// Soft-delete a movement.
    pub async fn deactivate_movement(&self, id: i64) -> Result<bool> {
        self.deactivate("movements", id).await
    }
}
