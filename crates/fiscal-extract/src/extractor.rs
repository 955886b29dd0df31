//! Invoice extraction through the LLM.

use fiscal_core::config::{ExtractionConfig, LlmConfig};
use fiscal_core::invoice::Invoice;
use fiscal_core::llm::{CompletionRequest, LlmProvider};
use fiscal_core::{Error, Result};
use std::sync::Arc;

use crate::classify::KeywordClassifier;
use crate::parse::parse_invoice;

const EXTRACTION_INSTRUCTIONS: &str = r#"Analyse the text of a Brazilian invoice (nota fiscal) and extract its data.

Return ONLY valid JSON with this structure:
{
  "number": "invoice number",
  "series": "invoice series",
  "issueDate": "issue date as YYYY-MM-DD",
  "supplier": {
    "legalName": "supplier legal name (razão social)",
    "tradeName": "supplier trade name (nome fantasia)",
    "taxId": "supplier CNPJ"
  },
  "billedTo": {
    "fullName": "full name of the billed customer",
    "taxId": "customer CPF if present, otherwise null"
  },
  "lineItems": [
    { "description": "product or service description", "quantity": "quantity" }
  ],
  "installments": [
    { "index": 1, "dueDate": "due date as YYYY-MM-DD", "amount": 0.0 }
  ],
  "totalAmount": 0.0,
  "expenseCategories": ["expense category based on the products"]
}

Use null for anything that is not available. Always format dates as YYYY-MM-DD."#;

/// Turns raw invoice text into an [`Invoice`].
///
/// One LLM call per invoice, no retries. When the model leaves the expense
/// categories empty, the keyword table classifies the line items instead.
pub struct InvoiceExtractor {
    llm: Arc<dyn LlmProvider>,
    classifier: KeywordClassifier,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl InvoiceExtractor {
    /// Create an extractor with the given keyword table.
    pub fn new(llm: Arc<dyn LlmProvider>, config: &ExtractionConfig) -> Self {
        let defaults = LlmConfig::default();
        Self {
            llm,
            classifier: KeywordClassifier::new(config),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
        }
    }

    /// Apply the extraction call's token budget and temperature.
    pub fn with_llm_config(mut self, config: &LlmConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self
    }

    /// Configured category names, in table order.
    pub fn categories(&self) -> Vec<&str> {
        self.classifier.categories()
    }

    /// Extract an invoice from already-extracted document text.
    ///
    /// Blank input is rejected without calling the model. Provider
    /// failures surface as [`Error::Provider`]; unusable replies as
    /// [`Error::ExtractionParse`].
    pub async fn extract(&self, document_text: &str) -> Result<Invoice> {
        if document_text.trim().is_empty() {
            return Err(Error::extraction_parse("invoice text is empty", ""));
        }

        let request = CompletionRequest::prompt(document_text)
            .with_system_prompt(EXTRACTION_INSTRUCTIONS)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);
        let reply = self.llm.complete(request).await?.content;

        let mut invoice = parse_invoice(&reply)?;
        if invoice.expense_categories.is_empty() {
            let category = self.classifier.classify(&invoice.items_description());
            log::debug!("model gave no category, keyword table chose {category}");
            invoice.expense_categories.insert(category.to_string());
        }
        Ok(invoice)
    }
}

impl std::fmt::Debug for InvoiceExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceExtractor")
            .field("llm", &self.llm.name())
            .field("categories", &self.classifier.categories().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fiscal_core::llm::MockLlmProvider;

    fn extractor(llm: &MockLlmProvider) -> InvoiceExtractor {
        InvoiceExtractor::new(Arc::new(llm.clone()), &ExtractionConfig::default())
    }

    #[tokio::test]
    async fn test_extract_keeps_model_categories() {
        let llm = MockLlmProvider::with_response(
            r#"{"lineItems":[{"description":"Sementes"}],"expenseCategories":["INVESTIMENTOS"]}"#,
        );
        let invoice = extractor(&llm).extract("NF-e 123").await.unwrap();
        assert_eq!(
            invoice.expense_categories.into_iter().collect::<Vec<_>>(),
            vec!["INVESTIMENTOS"]
        );
        assert_eq!(llm.prompts().await, vec!["NF-e 123".to_string()]);
    }

    #[tokio::test]
    async fn test_extract_classifies_when_categories_empty() {
        let llm = MockLlmProvider::with_response(
            "```json\n{\"lineItems\":[{\"description\":\"Óleo diesel\"}],\"expenseCategories\":[null]}\n```",
        );
        let invoice = extractor(&llm).extract("NF-e 124").await.unwrap();
        assert!(invoice.expense_categories.contains("MANUTENÇÃO E OPERAÇÃO"));
    }

    #[tokio::test]
    async fn test_extract_missing_categories_uses_default() {
        let llm = MockLlmProvider::with_response(r#"{"lineItems":[]}"#);
        let invoice = extractor(&llm).extract("NF-e 125").await.unwrap();
        assert!(invoice.expense_categories.contains("OUTRAS DESPESAS"));
    }

    #[tokio::test]
    async fn test_extract_empty_text_skips_llm() {
        let llm = MockLlmProvider::with_response("{}");
        let err = extractor(&llm).extract("  \n").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionParse { .. }));
        assert_eq!(llm.calls().await, 0);
    }

    #[tokio::test]
    async fn test_extract_provider_error_passes_through() {
        let llm = MockLlmProvider::failing("quota exceeded");
        let err = extractor(&llm).extract("NF-e").await.unwrap_err();
        assert!(err.is_provider());
    }

    #[tokio::test]
    async fn test_extract_garbage_reply() {
        let llm = MockLlmProvider::with_response("I could not find an invoice.");
        let err = extractor(&llm).extract("NF-e").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionParse { .. }));
    }

    #[test]
    fn test_categories_listing() {
        let llm = MockLlmProvider::with_response("{}");
        let ext = extractor(&llm);
        let names = ext.categories();
        assert_eq!(names.len(), 9);
        assert_eq!(names[8], "INVESTIMENTOS");
    }
}
