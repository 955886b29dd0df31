//! Keyword-based expense classification.

use fiscal_core::config::{CategoryRule, ExtractionConfig};

/// Maps product descriptions to an expense category by keyword.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<CategoryRule>,
    default_category: String,
}

impl KeywordClassifier {
    /// Build from the extraction configuration.
    ///
    /// Keywords are lower-cased here so hand-written config files may use
    /// acronyms like "ITR" as printed.
    pub fn new(config: &ExtractionConfig) -> Self {
        let rules = config
            .categories
            .iter()
            .map(|rule| CategoryRule {
                name: rule.name.clone(),
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self {
            rules,
            default_category: config.default_category.clone(),
        }
    }

    /// The first category (in table order) with a keyword contained in the
    /// lower-cased description, else the default category.
    pub fn classify(&self, description: &str) -> &str {
        let text = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|rule| rule.name.as_str())
            .unwrap_or(&self.default_category)
    }

    /// Category names in table order.
    pub fn categories(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
