/// Batched embedding of documents and queries
use super::{EmbeddingError, EmbeddingProvider};
use crate::document::Document;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Wraps an embedding provider with a batch size
///
/// Shared by the vector store (to embed documents) and the embedding
/// retriever (to embed queries), so both sides use the same model.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    /// Create a new embedder
    ///
    /// # Arguments
    /// * `provider` - Embedding provider
    /// * `batch_size` - Number of documents to embed in one call
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every document's content, in order
    pub fn embed_documents(&self, documents: &[Document]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let start = Instant::now();
        let total = documents.len();

        info!(
            "Embedding {} documents with {} (batch size {})",
            total,
            self.provider.model_name(),
            self.batch_size
        );

        let mut embeddings = Vec::with_capacity(total);
        for chunk in documents.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|d| d.content.clone()).collect();
            let batch = self.provider.embed_batch(&texts)?;

            if batch.len() != chunk.len() {
                return Err(EmbeddingError::GenerationError(format!(
                    "Embedding count mismatch: expected {}, got {}",
                    chunk.len(),
                    batch.len()
                )));
            }

            embeddings.extend(batch);
            debug!("Embedded {}/{} documents", embeddings.len(), total);
        }

        info!(
            "Embedding complete: {} documents in {}ms",
            total,
            start.elapsed().as_millis()
        );

        Ok(embeddings)
    }

    /// Embed a single query
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.provider.embed(query)
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}
