//! Error types for Fiscal operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Fiscal crates. Uses `thiserror` for derive macros.
//!
//! Some variants are reported to callers as structured failures rather than
//! propagated: the answer orchestrator folds [`Error::Generation`] and
//! [`Error::NoEmbeddings`] into its result type, and the context assembler
//! skips [`Error::NotFound`] references.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in Fiscal operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The remote LLM was unreachable or returned unusable content.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of the failure.
        message: String,
        /// Underlying transport or decode error, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The final answer could not be generated.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The embeddings strategy was used before any embedding exists.
    #[error(
        "No embeddings found. Ingest invoices or run `rebuild` before asking with embeddings."
    )]
    NoEmbeddings,

    /// A referenced entity does not exist (or is inactive).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A vector does not have the configured dimension.
    #[error("Malformed vector: expected dimension {expected}, got {actual}")]
    MalformedVector {
        /// Configured system-wide dimension.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// The LLM output for an invoice was not valid structured data.
    #[error("Extraction parse error: {message}")]
    ExtractionParse {
        /// Description of the parse failure.
        message: String,
        /// The raw model output, kept for diagnostics.
        raw: String,
    },

    /// Relational or embedding store failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Create a provider error wrapping an underlying cause.
    pub fn provider_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an extraction parse error carrying the raw model output.
    pub fn extraction_parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::ExtractionParse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true for failures of the remote LLM collaborator.
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Returns true for missing or inactive entities.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true for vector dimension drift.
    pub fn is_malformed_vector(&self) -> bool {
        matches!(self, Self::MalformedVector { .. })
    }
}

/// Result type alias using Fiscal's Error type.
pub type Result<T> = std::result::Result<T, Error>;
