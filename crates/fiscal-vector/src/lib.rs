//! Entity embeddings and similarity search for Fiscal.
//!
//! - [`encoder`]: the [`VectorEncoder`] seam plus the bag-of-words and
//!   LLM-digest encoders
//! - [`store`]: [`EntityEmbeddingStore`], the sqlite-backed record table
//! - [`ranker`]: cosine similarity and top-k selection

pub mod encoder;
pub mod ranker;
pub mod store;
pub mod types;

pub use encoder::{
    BagOfWordsEncoder, LlmDigestEncoder, VectorEncoder, digest_vector, token_slot, tokenize,
};
pub use ranker::{cosine_similarity, rank};
pub use store::EntityEmbeddingStore;
pub use types::{EmbeddingRecord, SimilarityResult};
