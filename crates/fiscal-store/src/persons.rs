//! Person table access.

use fiscal_core::model::{Person, PersonKind};
use fiscal_core::Result;
use sqlx::SqliteConnection;

use crate::Database;
use crate::rows::{PERSON_COLUMNS, PersonRow};

/// Fields of a person about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
    /// Role.
    pub kind: PersonKind,
    /// Legal name.
    pub legal_name: String,
    /// Trade name.
    pub trade_name: Option<String>,
    /// CNPJ/CPF.
    pub tax_id: Option<String>,
}

impl NewPerson {
    /// Create a person with only a role and a name.
    pub fn new(kind: PersonKind, legal_name: impl Into<String>) -> Self {
        Self {
            kind,
            legal_name: legal_name.into(),
            trade_name: None,
            tax_id: None,
        }
    }

    /// Set the document number.
    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    /// Set the trade name.
    pub fn with_trade_name(mut self, trade_name: impl Into<String>) -> Self {
        self.trade_name = Some(trade_name.into());
        self
    }
}

pub(crate) async fn insert(conn: &mut SqliteConnection, person: &NewPerson) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO persons (kind, legal_name, trade_name, tax_id, status)
         VALUES (?, ?, ?, ?, 'ACTIVE')",
    )
    .bind(person.kind.as_str())
    .bind(&person.legal_name)
    .bind(&person.trade_name)
    .bind(&person.tax_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub(crate) async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Person>> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ? AND status = 'ACTIVE'");
    sqlx::query_as::<_, PersonRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Person::try_from)
        .transpose()
}

pub(crate) async fn find_by_tax_id(
    conn: &mut SqliteConnection,
    kind: PersonKind,
    tax_id: &str,
) -> Result<Option<Person>> {
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM persons
         WHERE kind = ? AND tax_id = ? AND status = 'ACTIVE' ORDER BY id LIMIT 1"
    );
    sqlx::query_as::<_, PersonRow>(&sql)
        .bind(kind.as_str())
        .bind(tax_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(Person::try_from)
        .transpose()
}

pub(crate) async fn find_by_name(
    conn: &mut SqliteConnection,
    kind: PersonKind,
    legal_name: &str,
) -> Result<Option<Person>> {
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM persons
         WHERE kind = ? AND legal_name = ? AND status = 'ACTIVE' ORDER BY id LIMIT 1"
    );
    sqlx::query_as::<_, PersonRow>(&sql)
        .bind(kind.as_str())
        .bind(legal_name)
        .fetch_optional(&mut *conn)
        .await?
        .map(Person::try_from)
        .transpose()
}

pub(crate) async fn list(conn: &mut SqliteConnection) -> Result<Vec<Person>> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE status = 'ACTIVE' ORDER BY id");
    sqlx::query_as::<_, PersonRow>(&sql)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Person::try_from)
        .collect()
}

impl Database {
    /// Insert a new active person and return its id.
    pub async fn insert_person(&self, person: &NewPerson) -> Result<i64> {
        let mut conn = self.pool().acquire().await?;
        insert(&mut conn, person).await
    }

    /// The active person with this id, if any.
    pub async fn get_person(&self, id: i64) -> Result<Option<Person>> {
        let mut conn = self.pool().acquire().await?;
        get(&mut conn, id).await
    }

    /// The oldest active person with this role and document number, if any.
    pub async fn find_person_by_tax_id(
        &self,
        kind: PersonKind,
        tax_id: &str,
    ) -> Result<Option<Person>> {
        let mut conn = self.pool().acquire().await?;
        find_by_tax_id(&mut conn, kind, tax_id).await
    }

    /// Every active person, ordered by id.
    pub async fn list_persons(&self) -> Result<Vec<Person>> {
        let mut conn = self.pool().acquire().await?;
        list(&mut conn).await
    }

    /// Soft-delete a person. Returns false when it was absent or already inactive.
    pub async fn deactivate_person(&self, id: i64) -> Result<bool> {
        self.deactivate("persons", id).await
    }
}
