//! Retrieval-augmented answering for Fiscal.
//!
//! [`ContextAssembler`] turns ranked entity references (or a whole
//! snapshot) into a grouped context block; [`AnswerGenerator`] runs the
//! simple and embeddings strategies against the LLM and exposes the
//! `rebuild_all` / `reset_all` administrative operations.

pub mod answer;
pub mod context;

pub use answer::{AnswerGenerator, AnswerMethod, AnswerResult};
pub use context::{ContextAssembler, RetrievedContext};
