//! The structured invoice produced by extraction.
//!
//! Transient: built by the extractor, consumed by the relational store's
//! `persist_invoice`, never stored as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The issuing company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// Registered company name.
    pub legal_name: String,
    /// Trade name.
    pub trade_name: Option<String>,
    /// CNPJ.
    pub tax_id: Option<String>,
}

/// The billed party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledTo {
    /// Full name.
    pub full_name: String,
    /// CPF, when printed on the invoice.
    pub tax_id: Option<String>,
}

/// One product or service line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product description.
    pub description: String,
    /// Quantity as printed.
    pub quantity: Option<String>,
}

/// One scheduled payment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInstallment {
    /// 1-based position.
    pub index: u32,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Amount due.
    pub amount: f64,
}

/// A parsed invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Invoice number.
    pub number: Option<String>,
    /// Invoice series.
    pub series: Option<String>,
    /// Issue date.
    pub issue_date: Option<NaiveDate>,
    /// Issuer.
    pub supplier: Supplier,
    /// Billed party.
    pub billed_to: BilledTo,
    /// Product lines, in document order.
    pub line_items: Vec<LineItem>,
    /// Payment schedule, in document order.
    pub installments: Vec<InvoiceInstallment>,
    /// Invoice total.
    pub total_amount: f64,
    /// Expense category names.
    pub expense_categories: BTreeSet<String>,
}

impl Invoice {
    /// All line-item descriptions joined by a single space.
    pub fn items_description(&self) -> String {
        self.line_items
            .iter()
            .map(|item| item.description.as_str())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_items_description_skips_empty() {
        let invoice = Invoice {
            line_items: vec![
                LineItem {
                    description: "Óleo diesel".to_string(),
                    quantity: Some("100".to_string()),
                },
                LineItem::default(),
                LineItem {
                    description: "Filtro".to_string(),
                    quantity: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(invoice.items_description(), "Óleo diesel Filtro");
    }

    #[test]
    fn test_invoice_serializes_camel_case() {
        let invoice = Invoice {
            total_amount: 10.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&invoice).unwrap();
        assert!(json.contains("\"totalAmount\":10.0"));
        assert!(json.contains("\"billedTo\""));
        assert!(json.contains("\"expenseCategories\":[]"));
    }
}
