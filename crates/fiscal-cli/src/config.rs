//! Configuration for the `fiscal` binary.
//!
//! Provides the [`FiscalConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `FISCAL_CONFIG` environment variable
//! 3. XDG default: `~/.config/fiscal/config.toml`
//! 4. Built-in defaults
//!
//! String fields can be overridden per section, e.g. `FISCAL_LLM_API_KEY`
//! or `FISCAL_DATABASE_URL`.

use confyg::{Confygery, env};
use fiscal_core::config::{DatabaseConfig, EmbeddingConfig, ExtractionConfig, LlmConfig};
use fiscal_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "FISCAL";
const CONFIG_ENV_VAR: &str = "FISCAL_CONFIG";

/// Every configuration section, as read from file and environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalConfig {
    /// LLM provider.
    pub llm: LlmConfig,

    /// Embedding dimension and retrieval size.
    pub embedding: EmbeddingConfig,

    /// SQLite location.
    pub database: DatabaseConfig,

    /// Expense category keyword table.
    pub extraction: ExtractionConfig,
}

impl FiscalConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("llm");
        env_opts.add_section("embedding");
        env_opts.add_section("database");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        log::debug!(
            "loaded config: provider={}, database={}",
            config.llm.provider,
            config.database.url
        );
        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        resolve_path(explicit, std::env::var(CONFIG_ENV_VAR).ok())
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fiscal").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// A copy safe to print: the API key, if any, is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some("********".to_string());
        }
        copy
    }
}

fn resolve_path(explicit: Option<&str>, from_env: Option<String>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    FiscalConfig::default_config_path()
}

// ============================================================================
// Tests
// ============================================================================
