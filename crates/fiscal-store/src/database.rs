//! Connection pool, schema bootstrap, snapshots, and resets.

use fiscal_core::config::DatabaseConfig;
use fiscal_core::model::RelationalSnapshot;
use fiscal_core::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::schema;
use crate::{classifications, movements, persons};

/// Handle to the relational store.
///
/// Cheap to clone; clones share one connection pool. Every operation
/// acquires a pooled connection (or a transaction) for its own duration
/// only, and releases it on every exit path.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the configured database, creating the file and schema if
    /// needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        log::debug!("connected to {}", config.url);
        Self::from_pool(pool).await
    }

    /// A private in-memory database, pinned to a single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and bootstrap the schema.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// The underlying pool, shared with the embedding store.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&mut *conn).await?;
        }
        Ok(())
    }

    /// Flip `status` to INACTIVE on one row of an entity table.
    pub(crate) async fn deactivate(&self, table: &'static str, id: i64) -> Result<bool> {
        let sql = format!("UPDATE {table} SET status = 'INACTIVE' WHERE id = ? AND status = 'ACTIVE'");
        let affected = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected > 0 {
            log::info!("deactivated {table} row {id}");
        }
        Ok(affected > 0)
    }

    /// Every active row of every table, read inside one transaction.
    pub async fn snapshot(&self) -> Result<RelationalSnapshot> {
        let mut tx = self.pool.begin().await?;
        let snapshot = RelationalSnapshot {
            persons: persons::list(&mut tx).await?,
            classifications: classifications::list(&mut tx).await?,
            movements: movements::list(&mut tx).await?,
        };
        tx.commit().await?;
        Ok(snapshot)
    }

    /// Physically delete every relational row in one transaction.
    pub async fn reset_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in schema::RESET_ORDER {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        log::info!("relational store cleared");
        Ok(())
    }
}
