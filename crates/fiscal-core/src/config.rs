//! Configuration sections shared by Fiscal components.
//!
//! Each component receives its section explicitly through its constructor.
//! The CLI aggregates these into a single file-backed configuration.

use serde::{Deserialize, Serialize};

// ============================================================================
// LLM
// ============================================================================

/// Remote LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "gemini" or "mock".
    pub provider: String,

    /// Model identifier passed to the provider.
    pub model: String,

    /// API key. Usually supplied via `FISCAL_LLM_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the provider's REST API.
    pub base_url: String,

    /// Deadline for a single call, in seconds.
    pub timeout_secs: u64,

    /// Maximum tokens generated per call.
    pub max_tokens: u32,

    /// Sampling temperature; provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
            max_tokens: 2048,
            temperature: None,
        }
    }
}

// ============================================================================
// Embeddings
// ============================================================================

/// Embedding and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// System-wide vector dimension.
    pub dimension: usize,

    /// Number of similarity results used as context.
    pub top_k: usize,

    /// Token budget for the condensation requested by the primary encoder.
    pub summary_max_tokens: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 128,
            top_k: 5,
            summary_max_tokens: 256,
        }
    }
}

// ============================================================================
// Database
// ============================================================================

/// Relational and embedding store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    pub url: String,

    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://fiscal.db".to_string(),
            max_connections: 5,
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// A keyword rule mapping product descriptions to an expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category name stored as the classification description.
    pub name: String,

    /// Lower-case keywords; any substring match selects the category.
    pub keywords: Vec<String>,
}

impl CategoryRule {
    /// Create a rule from a name and keyword list.
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Invoice extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ordered keyword table; the first matching rule wins.
    pub categories: Vec<CategoryRule>,

    /// Category used when no rule matches.
    pub default_category: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            default_category: "OUTRAS DESPESAS".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Names of every configured category, in table order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "INSUMOS AGRÍCOLAS",
            &["sementes", "fertilizantes", "defensivos agrícolas", "corretivos"],
        ),
        CategoryRule::new(
            "MANUTENÇÃO E OPERAÇÃO",
            &[
                "combustíveis",
                "lubrificantes",
                "peças",
                "parafusos",
                "componentes mecânicos",
                "manutenção",
                "pneus",
                "filtros",
                "correias",
                "ferramentas",
                "utensílios",
                "diesel",
                "óleo",
            ],
        ),
        CategoryRule::new("RECURSOS HUMANOS", &["mão de obra", "salários", "encargos"]),
        CategoryRule::new(
            "SERVIÇOS OPERACIONAIS",
            &[
                "frete",
                "transporte",
                "colheita",
                "secagem",
                "armazenagem",
                "pulverização",
                "aplicação",
            ],
        ),
        CategoryRule::new(
            "INFRAESTRUTURA E UTILIDADES",
            &[
                "energia elétrica",
                "arrendamento",
                "construções",
                "reformas",
                "materiais de construção",
                "material hidráulico",
            ],
        ),
        CategoryRule::new(
            "ADMINISTRATIVAS",
            &[
                "honorários",
                "contábeis",
                "advocatícios",
                "agronômicos",
                "despesas bancárias",
                "financeiras",
            ],
        ),
        CategoryRule::new(
            "SEGUROS E PROTEÇÃO",
            &["seguro agrícola", "seguro de ativos", "seguro prestamista"],
        ),
        // Matched against lower-cased text, so the acronyms are stored lower-case.
        CategoryRule::new("IMPOSTOS E TAXAS", &["itr", "iptu", "ipva", "incra-ccir"]),
        CategoryRule::new(
            "INVESTIMENTOS",
            &[
                "aquisição de máquinas",
                "implementos",
                "veículos",
                "imóveis",
                "infraestrutura rural",
            ],
        ),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_embedding_config_default() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.dimension, 128);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn test_embedding_config_partial_json() {
        let config: EmbeddingConfig = serde_json::from_str(r#"{"dimension": 64}"#).unwrap();
        assert_eq!(config.dimension, 64);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn test_extraction_config_default_table() {
        let config = ExtractionConfig::default();
        assert_eq!(config.categories.len(), 9);
        assert_eq!(config.category_names()[0], "INSUMOS AGRÍCOLAS");
        assert_eq!(config.default_category, "OUTRAS DESPESAS");
    }

    #[test]
    fn test_keywords_are_lower_case() {
        let config = ExtractionConfig::default();
        for rule in &config.categories {
            for keyword in &rule.keywords {
                assert_eq!(keyword, &keyword.to_lowercase(), "rule {}", rule.name);
            }
        }
    }

    #[test]
    fn test_api_key_not_serialized_when_absent() {
        let json = serde_json::to_string(&LlmConfig::default()).unwrap();
        assert!(!json.contains("api_key"));
    }
}
