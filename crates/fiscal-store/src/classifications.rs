//! Classification table access.

use fiscal_core::model::{Classification, ClassificationKind};
use fiscal_core::Result;
use sqlx::SqliteConnection;

use crate::Database;
use crate::rows::{CLASSIFICATION_COLUMNS, ClassificationRow};

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    kind: ClassificationKind,
    description: &str,
) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO classifications (kind, description, status) VALUES (?, ?, 'ACTIVE')",
    )
    .bind(kind.as_str())
    .bind(description)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub(crate) async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Classification>> {
    let sql = format!(
        "SELECT {CLASSIFICATION_COLUMNS} FROM classifications WHERE id = ? AND status = 'ACTIVE'"
    );
    sqlx::query_as::<_, ClassificationRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Classification::try_from)
        .transpose()
}

/// Case-insensitive lookup among active classifications of one kind.
pub(crate) async fn find_by_description(
    conn: &mut SqliteConnection,
    kind: ClassificationKind,
    description: &str,
) -> Result<Option<Classification>> {
    let sql = format!(
        "SELECT {CLASSIFICATION_COLUMNS} FROM classifications
         WHERE kind = ? AND UPPER(description) = UPPER(?) AND status = 'ACTIVE'
         ORDER BY id LIMIT 1"
    );
    sqlx::query_as::<_, ClassificationRow>(&sql)
        .bind(kind.as_str())
        .bind(description)
        .fetch_optional(&mut *conn)
        .await?
        .map(Classification::try_from)
        .transpose()
}

pub(crate) async fn list(conn: &mut SqliteConnection) -> Result<Vec<Classification>> {
    let sql = format!(
        "SELECT {CLASSIFICATION_COLUMNS} FROM classifications WHERE status = 'ACTIVE' ORDER BY id"
    );
    sqlx::query_as::<_, ClassificationRow>(&sql)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Classification::try_from)
        .collect()
}

impl Database {
    /// Insert a new active classification and return its id.
    pub async fn insert_classification(
        &self,
        kind: ClassificationKind,
        description: &str,
    ) -> Result<i64> {
        let mut conn = self.pool().acquire().await?;
        insert(&mut conn, kind, description).await
    }

    /// The active classification with this id, if any.
    pub async fn get_classification(&self, id: i64) -> Result<Option<Classification>> {
        let mut conn = self.pool().acquire().await?;
        get(&mut conn, id).await
    }

    /// The active classification with this description (ASCII case-insensitive).
    pub async fn find_classification_by_description(
        &self,
        kind: ClassificationKind,
        description: &str,
    ) -> Result<Option<Classification>> {
        let mut conn = self.pool().acquire().await?;
        find_by_description(&mut conn, kind, description).await
    }

    /// Every active classification, ordered by id.
    pub async fn list_classifications(&self) -> Result<Vec<Classification>> {
        let mut conn = self.pool().acquire().await?;
        list(&mut conn).await
    }

    /// Soft-delete a classification.
    pub async fn deactivate_classification(&self, id: i64) -> Result<bool> {
        self.deactivate("classifications", id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find_classification() {
        let db = Database::in_memory().await.unwrap();
        let id = db
            .insert_classification(ClassificationKind::Expense, "INSUMOS AGRÍCOLAS")
            .await
            .unwrap();

        let found = db
            .find_classification_by_description(ClassificationKind::Expense, "INSUMOS AGRÍCOLAS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);

        let other_kind = db
            .find_classification_by_description(ClassificationKind::Revenue, "INSUMOS AGRÍCOLAS")
            .await
            .unwrap();
        assert!(other_kind.is_none());
    }

    #[tokio::test]
    async fn test_find_classification_ignores_ascii_case() {
        let db = Database::in_memory().await.unwrap();
        db.insert_classification(ClassificationKind::Expense, "ADMINISTRATIVAS")
            .await
            .unwrap();
        let found = db
            .find_classification_by_description(ClassificationKind::Expense, "administrativas")
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_deactivate_classification() {
        let db = Database::in_memory().await.unwrap();
        let id = db
            .insert_classification(ClassificationKind::Expense, "FRETE")
            .await
            .unwrap();
        assert!(db.deactivate_classification(id).await.unwrap());
        assert!(db.get_classification(id).await.unwrap().is_none());
        assert!(db.list_classifications().await.unwrap().is_empty());
    }
}
