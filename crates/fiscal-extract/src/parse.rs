//! Strict parsing of the model's invoice JSON.
//!
//! The model is asked for one JSON object. Its reply may be wrapped in a
//! Markdown code fence, and scalar fields come back as numbers or strings
//! depending on the day; both are accepted. Anything that is not a JSON
//! object is an [`Error::ExtractionParse`] carrying the raw reply.

use chrono::NaiveDate;
use fiscal_core::invoice::{BilledTo, Invoice, InvoiceInstallment, LineItem, Supplier};
use fiscal_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInvoice {
    number: Value,
    series: Value,
    issue_date: Value,
    supplier: Option<RawSupplier>,
    billed_to: Option<RawBilledTo>,
    line_items: Option<Vec<RawLineItem>>,
    installments: Option<Vec<RawInstallment>>,
    total_amount: Value,
    expense_categories: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSupplier {
    legal_name: Value,
    trade_name: Value,
    tax_id: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawBilledTo {
    full_name: Value,
    tax_id: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLineItem {
    description: Value,
    quantity: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInstallment {
    index: Value,
    due_date: Value,
    amount: Value,
}

/// Remove a surrounding ```` ```json ```` or ```` ``` ```` fence.
pub fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model reply into an [`Invoice`].
///
/// Category entries that are null or blank are dropped; the caller decides
/// what an empty category set means.
pub fn parse_invoice(reply: &str) -> Result<Invoice> {
    let body = strip_fences(reply);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::extraction_parse(format!("invalid JSON: {e}"), reply))?;
    if !value.is_object() {
        return Err(Error::extraction_parse(
            "expected a JSON object at the top level",
            reply,
        ));
    }
    let raw: RawInvoice = serde_json::from_value(value)
        .map_err(|e| Error::extraction_parse(format!("unexpected invoice shape: {e}"), reply))?;

    let supplier = raw.supplier.unwrap_or_default();
    let billed_to = raw.billed_to.unwrap_or_default();

    let line_items = raw
        .line_items
        .unwrap_or_default()
        .into_iter()
        .map(|item| LineItem {
            description: text(&item.description).unwrap_or_default(),
            quantity: text(&item.quantity),
        })
        .collect();

    let installments: Vec<InvoiceInstallment> = raw
        .installments
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(position, inst)| InvoiceInstallment {
            index: index(&inst.index).unwrap_or(position as u32 + 1),
            due_date: date(&inst.due_date),
            amount: amount(&inst.amount).unwrap_or(0.0),
        })
        .collect();

    let total_amount = amount(&raw.total_amount)
        .unwrap_or_else(|| installments.iter().map(|i| i.amount).sum());

    Ok(Invoice {
        number: text(&raw.number),
        series: text(&raw.series),
        issue_date: date(&raw.issue_date),
        supplier: Supplier {
            legal_name: text(&supplier.legal_name).unwrap_or_default(),
            trade_name: text(&supplier.trade_name),
            tax_id: text(&supplier.tax_id),
        },
        billed_to: BilledTo {
            full_name: text(&billed_to.full_name).unwrap_or_default(),
            tax_id: text(&billed_to.tax_id),
        },
        line_items,
        installments,
        total_amount,
        expense_categories: categories(&raw.expense_categories),
    })
}

/// Non-blank string, or a number rendered as text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A JSON number, or a numeric string in either `1234.56` or
/// `1.234,56` notation, optionally prefixed with `R$`.
fn amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let normalised = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    normalised.parse().ok()
}

fn index(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

fn categories(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(text).collect(),
        other => text(other).into_iter().collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REPLY: &str = r#"```json
{
  "number": "000123",
  "series": 1,
  "issueDate": "2025-03-10",
  "supplier": { "legalName": "Agro Sul Ltda", "tradeName": "Agro Sul", "taxId": "12.345.678/0001-90" },
  "billedTo": { "fullName": "Maria Souza", "taxId": null },
  "lineItems": [
    { "description": "Óleo diesel S10", "quantity": "500" },
    { "description": "Filtro de ar", "quantity": 2 }
  ],
  "installments": [
    { "index": 1, "dueDate": "2025-04-10", "amount": "1.500,00" },
    { "index": "2", "dueDate": "10/05/2025", "amount": 1500.5 }
  ],
  "totalAmount": "3000,50",
  "expenseCategories": ["MANUTENÇÃO E OPERAÇÃO", null]
}
```"#;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_full_reply() {
        let invoice = parse_invoice(REPLY).unwrap();
        assert_eq!(invoice.number.as_deref(), Some("000123"));
        assert_eq!(invoice.series.as_deref(), Some("1"));
        assert_eq!(
            invoice.issue_date,
            NaiveDate::from_ymd_opt(2025, 3, 10)
        );
        assert_eq!(invoice.supplier.trade_name.as_deref(), Some("Agro Sul"));
        assert_eq!(invoice.billed_to.tax_id, None);
        assert_eq!(invoice.line_items[1].quantity.as_deref(), Some("2"));
        assert_eq!(invoice.installments[0].amount, 1500.0);
        assert_eq!(invoice.installments[1].index, 2);
        assert_eq!(invoice.installments[1].due_date, None);
        assert_eq!(invoice.total_amount, 3000.5);
        assert_eq!(invoice.expense_categories.len(), 1);
    }

    #[test]
    fn test_missing_total_sums_installments() {
        let invoice =
            parse_invoice(r#"{"installments":[{"amount":10},{"amount":"2,5"}]}"#).unwrap();
        assert_eq!(invoice.total_amount, 12.5);
        assert_eq!(invoice.installments[1].index, 2);
    }

    #[test]
    fn test_null_categories_are_empty() {
        let invoice = parse_invoice(r#"{"expenseCategories":[null, "  "]}"#).unwrap();
        assert!(invoice.expense_categories.is_empty());
    }

    #[test]
    fn test_non_json_is_extraction_error() {
        let err = parse_invoice("Sorry, I cannot read this invoice.").unwrap_err();
        assert!(matches!(
            err,
            Error::ExtractionParse { ref raw, .. } if raw == "Sorry, I cannot read this invoice."
        ));
    }

    #[test]
    fn test_non_object_is_extraction_error() {
        let err = parse_invoice("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, Error::ExtractionParse { .. }));
    }

    #[test]
    fn test_wrong_nested_shape_is_extraction_error() {
        let err = parse_invoice(r#"{"supplier": "Agro"}"#).unwrap_err();
        assert!(matches!(err, Error::ExtractionParse { .. }));
    }

    #[test]
    fn test_parse_decimal_notations() {
        assert_eq!(parse_decimal("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1234.56"), Some(1234.56));
        assert_eq!(parse_decimal("abc"), None);
    }
}
