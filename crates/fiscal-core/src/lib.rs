//! Fiscal Core: shared types, errors, configuration, and LLM providers.
//!
//! This crate has no internal Fiscal dependencies. Everything that talks to
//! the remote language model goes through [`llm::LlmProvider`].
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`config`]: Configuration sections passed to component constructors
//! - [`llm`]: Provider trait plus Gemini, mock, and deadline implementations
//! - [`model`]: Relational records and their source-text templates
//! - [`invoice`]: The transient extraction result

pub mod config;
pub mod error;
pub mod invoice;
pub mod llm;
pub mod model;

// Re-export key types at crate root for convenience
pub use config::{CategoryRule, DatabaseConfig, EmbeddingConfig, ExtractionConfig, LlmConfig};
pub use error::{Error, Result};
pub use invoice::Invoice;
pub use model::{
    Classification, ClassificationKind, Embeddable, EntityKind, Installment, InstallmentStatus,
    Movement, MovementKind, Person, PersonKind, RecordStatus, RelationalSnapshot,
};
