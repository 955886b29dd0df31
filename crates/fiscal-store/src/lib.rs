//! Relational store for Fiscal.
//!
//! SQLite via `sqlx`. Persons, classifications, and movements are never
//! physically deleted except by [`Database::reset_all`]; ordinary deletion
//! flips their status to inactive, and every read path only returns active
//! rows.
//!
//! # Example
//!
//! ```rust,ignore
//! use fiscal_store::Database;
//!
//! let db = Database::connect(&config.database).await?;
//! let outcome = db.persist_invoice(&invoice).await?;
//! let snapshot = db.snapshot().await?;
//! ```

pub mod classifications;
pub mod database;
pub mod ingest;
pub mod movements;
pub mod persons;
pub mod schema;

mod rows;

pub use database::Database;
pub use ingest::PersistOutcome;
pub use movements::{NewInstallment, NewMovement};
pub use persons::NewPerson;
