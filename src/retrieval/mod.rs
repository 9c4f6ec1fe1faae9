//! Retrievers: rank a store's documents against a query
//!
//! - [`Bm25Retriever`] uses the keyword index of an [`InMemoryDocumentStore`]
//! - [`EmbeddingRetriever`] embeds the query and searches a
//!   [`VectorDocumentStore`]
//!
//! Retrievers borrow their store; nothing is cached between queries.
//!
//! [`InMemoryDocumentStore`]: crate::store::InMemoryDocumentStore
//! [`VectorDocumentStore`]: crate::store::VectorDocumentStore

mod bm25;
mod dense;

pub use bm25::Bm25Retriever;
pub use dense::EmbeddingRetriever;

use crate::document::ScoredDocument;
use crate::error::Result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("top_k must be greater than 0")]
    InvalidTopK,

    #[error("Document store has no BM25 index")]
    KeywordSearchUnavailable,

    #[error("Embedder produces {embedder}-dimensional vectors but the store holds {store}")]
    DimensionMismatch { embedder: usize, store: usize },

    #[error("Store was embedded with '{store}' but the query embedder is '{embedder}'; rebuild the index")]
    ModelMismatch { embedder: String, store: String },
}

/// Ranks documents against a free-text query
pub trait Retriever {
    /// Return at most `top_k` documents, highest score first
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>>;
}

pub(crate) fn check_top_k(top_k: usize) -> std::result::Result<(), RetrievalError> {
    if top_k == 0 {
        Err(RetrievalError::InvalidTopK)
    } else {
        Ok(())
    }
}
