//! Invoice extraction and ingestion for Fiscal.
//!
//! [`InvoiceExtractor`] asks the LLM for a JSON rendering of an invoice and
//! parses it strictly; [`Ingestor`] persists the result and embeds the
//! entities it created.

pub mod classify;
pub mod extractor;
pub mod ingest;
pub mod parse;

pub use classify::KeywordClassifier;
pub use extractor::InvoiceExtractor;
pub use ingest::{IngestReport, Ingestor};
pub use parse::{parse_invoice, strip_fences};
