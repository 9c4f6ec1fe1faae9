use super::{check_top_k, RetrievalError, Retriever};
use crate::document::ScoredDocument;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::VectorDocumentStore;

/// Dense retriever: embeds the query and searches the store's vector index
///
/// The embedder must be the one the store's embeddings were computed with;
/// both its dimension and its model name are checked.
pub struct EmbeddingRetriever<'s> {
    store: &'s VectorDocumentStore,
    embedder: Embedder,
}

impl<'s> EmbeddingRetriever<'s> {
    pub fn new(
        store: &'s VectorDocumentStore,
        embedder: Embedder,
    ) -> std::result::Result<Self, RetrievalError> {
        if let Some(dimension) = store.dimension() {
            if dimension != embedder.dimension() {
                return Err(RetrievalError::DimensionMismatch {
                    embedder: embedder.dimension(),
                    store: dimension,
                });
            }
        }
        if let Some(model) = store.embedding_model() {
            if model != embedder.model_name() {
                return Err(RetrievalError::ModelMismatch {
                    embedder: embedder.model_name().to_string(),
                    store: model.to_string(),
                });
            }
        }
        Ok(Self { store, embedder })
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }
}

impl Retriever for EmbeddingRetriever<'_> {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        check_top_k(top_k)?;

        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_query(query)?;
        let results = self.store.query_by_embedding(&embedding, top_k)?;
        tracing::debug!(
            "Embedding search returned {} documents for {:?}",
            results.len(),
            query
        );
        Ok(results)
    }
}
