//! Relational domain records.
//!
//! These are the named-field records returned by the relational store. The
//! embedding subsystem only ever refers to them through `(EntityKind, id)`
//! pairs and renders them to text with [`Embeddable::source_text`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Declares a unit enum persisted as an upper-case string.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// The stored string form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(Error::invalid_data(format!(
                        concat!("unknown ", stringify!($name), ": '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum! {
    /// The three entity families that can be embedded.
    EntityKind {
        /// A supplier or billed party.
        Person => "PERSON",
        /// An expense/revenue classification.
        Classification => "CLASSIFICATION",
        /// A financial movement (one invoice).
        Movement => "MOVEMENT",
    }
}

text_enum! {
    /// Role of a person in a movement.
    PersonKind {
        /// The invoice issuer.
        Supplier => "SUPPLIER",
        /// The party being billed.
        BilledTo => "BILLED_TO",
    }
}

text_enum! {
    /// Classification family.
    ClassificationKind {
        /// Expense category.
        Expense => "EXPENSE",
        /// Revenue category.
        Revenue => "REVENUE",
    }
}

text_enum! {
    /// Direction of a movement.
    MovementKind {
        /// Accounts payable.
        Payable => "PAYABLE",
        /// Accounts receivable.
        Receivable => "RECEIVABLE",
    }
}

text_enum! {
    /// Soft-delete marker shared by persons, classifications, and movements.
    RecordStatus {
        /// Visible to every read path.
        Active => "ACTIVE",
        /// Soft-deleted; treated as absent by the core.
        Inactive => "INACTIVE",
    }
}

text_enum! {
    /// Settlement state of an installment.
    InstallmentStatus {
        /// Not yet paid in full.
        Open => "OPEN",
        /// Fully paid.
        Paid => "PAID",
    }
}

// ============================================================================
// Records
// ============================================================================

/// A supplier or billed party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Row id.
    pub id: i64,
    /// Role.
    pub kind: PersonKind,
    /// Legal (registered) name.
    pub legal_name: String,
    /// Trade name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    /// CNPJ/CPF document number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Soft-delete status.
    pub status: RecordStatus,
}

/// An expense or revenue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Row id.
    pub id: i64,
    /// Family.
    pub kind: ClassificationKind,
    /// Category name.
    pub description: String,
    /// Soft-delete status.
    pub status: RecordStatus,
}

/// One payment slice of a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// Row id.
    pub id: i64,
    /// Display label, e.g. "1/3".
    pub label: String,
    /// Due date, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Amount due.
    pub amount: f64,
    /// Amount already paid.
    pub paid_amount: f64,
    /// Remaining balance.
    pub balance: f64,
    /// Settlement state.
    pub status: InstallmentStatus,
    /// Owning movement.
    pub movement_id: i64,
}

/// A financial movement created from one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Row id.
    pub id: i64,
    /// Direction.
    pub kind: MovementKind,
    /// Invoice number, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Issue date, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    /// Free-text description (line items).
    pub description: String,
    /// Invoice total.
    pub total_amount: f64,
    /// Supplier person id.
    pub supplier_id: i64,
    /// Billed-to person id.
    pub billed_to_id: i64,
    /// Soft-delete status.
    pub status: RecordStatus,
    /// Installments, ordered by id.
    #[serde(default)]
    pub installments: Vec<Installment>,
    /// Linked classification ids.
    #[serde(default)]
    pub classification_ids: Vec<i64>,
}

/// Every active row of every table, taken at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationalSnapshot {
    /// Active persons.
    pub persons: Vec<Person>,
    /// Active classifications.
    pub classifications: Vec<Classification>,
    /// Active movements with installments and links.
    pub movements: Vec<Movement>,
}

impl RelationalSnapshot {
    /// Total number of rows across the three entity tables.
    pub fn len(&self) -> usize {
        self.persons.len() + self.classifications.len() + self.movements.len()
    }

    /// True when no entity row exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row as an embeddable entity: persons, then classifications,
    /// then movements.
    pub fn embeddables(&self) -> Vec<&dyn Embeddable> {
        let mut out: Vec<&dyn Embeddable> = Vec::with_capacity(self.len());
        out.extend(self.persons.iter().map(|p| p as &dyn Embeddable));
        out.extend(self.classifications.iter().map(|c| c as &dyn Embeddable));
        out.extend(self.movements.iter().map(|m| m as &dyn Embeddable));
        out
    }
}

// ============================================================================
// Source-text templates
// ============================================================================

/// An entity that can be rendered into text for embedding.
pub trait Embeddable {
    /// The entity family.
    fn entity_kind(&self) -> EntityKind;

    /// The row id inside its family.
    fn entity_id(&self) -> i64;

    /// The canonical human-readable text that gets embedded.
    fn source_text(&self) -> String;
}

impl Embeddable for Person {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Person
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn source_text(&self) -> String {
        format!(
            "Person {}: {}, Document: {}",
            self.kind,
            self.legal_name,
            self.tax_id.as_deref().unwrap_or("N/A")
        )
    }
}

impl Embeddable for Classification {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Classification
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn source_text(&self) -> String {
        format!("Expense classification: {}", self.description)
    }
}

impl Embeddable for Movement {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Movement
    }

    fn entity_id(&self) -> i64 {
        self.id
    }

    fn source_text(&self) -> String {
        let date = self
            .issue_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "Movement invoice {}, date {}, description: {}, amount: {:.2}",
            self.invoice_number.as_deref().unwrap_or("N/A"),
            date,
            self.description,
            self.total_amount
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
