//! Embedding generation and the indexes behind retrieval
//!
//! Architecture:
//! - EmbeddingProvider trait for abstraction
//! - FastEmbedProvider for local ONNX embedding models
//! - HashingEmbedder for deterministic, download-free embeddings
//! - Embedder for batched document embedding
//! - Tantivy (in RAM) for BM25 keyword search
//! - Flat (ndarray) or HNSW vector index for similarity search
mod embedder;
mod hashing;
mod keyword_index;
mod provider;
mod vector_index;

pub use embedder::Embedder;
pub use hashing::HashingEmbedder;
pub use keyword_index::{KeywordIndex, KeywordIndexError, KeywordSearchResult};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{
    HnswParams, IndexFactory, SearchResult, Similarity, VectorIndex, VectorIndexError,
};

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use std::sync::Arc;

/// Resolve the configured embedding backend into a provider
///
/// FastEmbed models are downloaded on first use, so this can take a while.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match config.backend {
        EmbeddingBackend::FastEmbed => Ok(Arc::new(FastEmbedProvider::new(&config.model)?)),
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hashing_provider() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Hashing,
            dimension: 64,
            ..EmbeddingConfig::default()
        };

        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.dimension(), 64);
        assert_eq!(provider.model_name(), "hashing");
    }

    #[test]
    fn test_build_unknown_fastembed_model() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::FastEmbed,
            model: "not-a-model".to_string(),
            ..EmbeddingConfig::default()
        };

        assert!(matches!(
            build_provider(&config),
            Err(EmbeddingError::InitializationError(_))
        ));
    }
}
