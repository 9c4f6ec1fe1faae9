use super::persistence;
use super::{DocumentCollection, DocumentStore, DuplicatePolicy, WriteSummary};
use crate::config::StoreConfig;
use crate::document::{Document, DocumentId, ScoredDocument};
use crate::embedding::{Embedder, HnswParams, IndexFactory, Similarity, VectorIndex};
use crate::error::{QaError, Result};
use std::path::Path;

/// Index settings that travel with a persisted store
#[derive(Debug, Clone, Copy)]
pub(super) struct Settings {
    pub policy: DuplicatePolicy,
    pub similarity: Similarity,
    pub index_factory: IndexFactory,
    pub hnsw: HnswParams,
    pub scale_score: bool,
}

/// Document store with one embedding per document and a similarity index
///
/// Embeddings are only computed by [`Self::update_embeddings`]; writing
/// documents never embeds them.
pub struct VectorDocumentStore {
    documents: DocumentCollection,
    settings: Settings,
    dimension: Option<usize>,
    embedding_model: Option<String>,
    index: Option<VectorIndex>,
}

impl VectorDocumentStore {
    /// Create an empty store
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.index_factory == IndexFactory::Hnsw && config.similarity != Similarity::Cosine {
            return Err(QaError::Config(format!(
                "Index factory 'hnsw' requires cosine similarity, got '{}'",
                config.similarity.as_str()
            )));
        }

        Ok(Self {
            documents: DocumentCollection::new(),
            settings: Settings {
                policy: config.duplicate_documents,
                similarity: config.similarity,
                index_factory: config.index_factory,
                hnsw: config.hnsw,
                scale_score: config.scale_score,
            },
            dimension: None,
            embedding_model: None,
            index: None,
        })
    }

    /// Restore a store written by [`Self::save`]
    ///
    /// The saved similarity and index settings are used, not the current
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = persistence::load(path)?;

        let mut documents = DocumentCollection::new();
        documents.write(snapshot.documents, DuplicatePolicy::Overwrite)?;

        let mut store = Self {
            documents,
            settings: snapshot.settings,
            dimension: snapshot.dimension,
            embedding_model: snapshot.embedding_model,
            index: None,
        };
        store.rebuild_index().map_err(|e| QaError::IndexLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!(
            "Loaded {} documents ({} embeddings) from {}",
            store.get_document_count(),
            store.get_embedding_count(),
            path.display()
        );

        Ok(store)
    }

    /// Persist documents, embeddings and index settings to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save(
            path,
            &self.settings,
            self.dimension,
            self.embedding_model.as_deref(),
            self.documents.as_slice(),
        )
    }

    /// Recompute the embedding of every stored document and rebuild the index
    ///
    /// Documents that already have an embedding are embedded again.
    ///
    /// # Returns
    /// Number of documents embedded
    pub fn update_embeddings(&mut self, embedder: &Embedder) -> Result<usize> {
        let count = self.documents.as_slice().len();
        if count == 0 {
            tracing::warn!("No documents to embed");
            self.index = None;
            return Ok(0);
        }

        tracing::info!("Updating embeddings for {} documents", count);
        let embeddings = embedder.embed_documents(self.documents.as_slice())?;
        for (doc, embedding) in self.documents.iter_mut().zip(embeddings) {
            doc.embedding = Some(embedding);
        }
        self.dimension = Some(embedder.dimension());
        self.embedding_model = Some(embedder.model_name().to_string());

        self.rebuild_index()?;
        Ok(count)
    }

    /// Number of documents that currently carry an embedding
    pub fn get_embedding_count(&self) -> usize {
        self.documents
            .as_slice()
            .iter()
            .filter(|d| d.embedding.is_some())
            .count()
    }

    /// Rank embedded documents by similarity to `query`
    ///
    /// # Returns
    /// At most `top_k` documents, best first; scores are mapped into [0, 1]
    /// when score scaling is enabled
    pub fn query_by_embedding(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        let index = match &self.index {
            Some(index) => index,
            None => {
                tracing::warn!("Vector store has no embeddings; run update_embeddings first");
                return Ok(Vec::new());
            }
        };

        let hits = index.search(query, top_k)?;
        let results = hits
            .into_iter()
            .filter_map(|hit| {
                self.documents.at(hit.position).map(|doc| {
                    let score = if self.settings.scale_score {
                        self.settings.similarity.scale(hit.score)
                    } else {
                        hit.score
                    };
                    ScoredDocument::new(doc.clone(), score)
                })
            })
            .collect();

        Ok(results)
    }

    pub fn similarity(&self) -> Similarity {
        self.settings.similarity
    }

    pub fn index_factory(&self) -> IndexFactory {
        self.settings.index_factory
    }

    /// Embedding size, once embeddings exist
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Model the stored embeddings were computed with
    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let vectors: Vec<(usize, &[f32])> = self
            .documents
            .as_slice()
            .iter()
            .enumerate()
            .filter_map(|(pos, doc)| doc.embedding.as_deref().map(|e| (pos, e)))
            .collect();

        let Some(&(_, first)) = vectors.first() else {
            self.index = None;
            return Ok(());
        };

        let dimension = self.dimension.unwrap_or(first.len());
        let index = VectorIndex::build(
            self.settings.index_factory,
            self.settings.similarity,
            dimension,
            self.settings.hnsw,
            &vectors,
        )?;
        tracing::debug!(
            "Built {} index over {} vectors",
            self.settings.index_factory.as_str(),
            index.len()
        );

        self.dimension = Some(dimension);
        self.index = Some(index);
        Ok(())
    }
}

impl DocumentStore for VectorDocumentStore {
    fn write_documents(&mut self, mut documents: Vec<Document>) -> Result<WriteSummary> {
        // Same id and content means the stored embedding is still valid
        for doc in documents.iter_mut().filter(|d| d.embedding.is_none()) {
            if let Some(existing) = self.documents.get(&doc.id) {
                if existing.content == doc.content {
                    doc.embedding = existing.embedding.clone();
                }
            }
        }

        let (summary, _) = self.documents.write(documents, self.settings.policy)?;
        self.rebuild_index()?;
        Ok(summary)
    }

    fn get_all_documents(&self) -> &[Document] {
        self.documents.as_slice()
    }

    fn get_document_by_id(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedding::{EmbeddingError, EmbeddingProvider, HashingEmbedder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_config() -> StoreConfig {
        Config::default().store
    }

    fn hashing_embedder() -> Embedder {
        Embedder::new(Arc::new(HashingEmbedder::new(256).unwrap()), 8)
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::from_text("Jon Snow is the bastard son of Ned Stark"),
            Document::from_text("Dragons breathe fire over the narrow sea"),
            Document::from_text("Winterfell is the seat of House Stark"),
        ]
    }

    /// Counts texts embedded, to prove every document is re-embedded
    struct CountingProvider {
        inner: HashingEmbedder,
        texts: AtomicUsize,
    }

    impl EmbeddingProvider for CountingProvider {
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            self.texts.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }

        fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            self.texts.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.embed_batch(texts)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_query_before_embeddings_is_empty() {
        let mut store = VectorDocumentStore::new(&store_config()).unwrap();
        store.write_documents(corpus()).unwrap();

        assert_eq!(store.get_document_count(), 3);
        assert_eq!(store.get_embedding_count(), 0);
        assert!(store.query_by_embedding(&[0.0; 256], 3).unwrap().is_empty());
    }

    #[test]
    fn test_update_embeddings_and_query() {
        let embedder = hashing_embedder();
        let mut store = VectorDocumentStore::new(&store_config()).unwrap();
        store.write_documents(corpus()).unwrap();

        assert_eq!(store.update_embeddings(&embedder).unwrap(), 3);
        assert_eq!(store.get_embedding_count(), 3);
        assert_eq!(store.dimension(), Some(256));

        let query = embedder.embed_query("dragons breathe fire").unwrap();
        let results = store.query_by_embedding(&query, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].document.content.starts_with("Dragons"));
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_update_embeddings_recomputes_all() {
        let provider = Arc::new(CountingProvider {
            inner: HashingEmbedder::new(64).unwrap(),
            texts: AtomicUsize::new(0),
        });
        let embedder = Embedder::new(provider.clone(), 2);
        let mut store = VectorDocumentStore::new(&store_config()).unwrap();
        store.write_documents(corpus()).unwrap();

        store.update_embeddings(&embedder).unwrap();
        store
            .write_documents(vec![Document::from_text("A new document")])
            .unwrap();
        store.update_embeddings(&embedder).unwrap();

        assert_eq!(provider.texts.load(Ordering::SeqCst), 3 + 4);
        assert_eq!(store.get_embedding_count(), 4);
    }

    #[test]
    fn test_overwrite_keeps_embedding() {
        let mut store = VectorDocumentStore::new(&store_config()).unwrap();
        store.write_documents(corpus()).unwrap();
        store.update_embeddings(&hashing_embedder()).unwrap();

        store.write_documents(corpus()).unwrap();
        assert_eq!(store.get_document_count(), 3);
        assert_eq!(store.get_embedding_count(), 3);
    }

    #[test]
    fn test_save_and_load_preserves_results() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("idx.path");
        let embedder = hashing_embedder();

        let mut store = VectorDocumentStore::new(&store_config()).unwrap();
        store.write_documents(corpus()).unwrap();
        store.update_embeddings(&embedder).unwrap();
        store.save(&path).unwrap();

        let loaded = VectorDocumentStore::load(&path).unwrap();
        assert_eq!(loaded.get_document_count(), 3);
        assert_eq!(loaded.embedding_model(), Some("hashing"));
        assert_eq!(loaded.get_embedding_count(), 3);

        let query = embedder.embed_query("House Stark").unwrap();
        let before: Vec<_> = store
            .query_by_embedding(&query, 3)
            .unwrap()
            .into_iter()
            .map(|r| r.document.id)
            .collect();
        let after: Vec<_> = loaded
            .query_by_embedding(&query, 3)
            .unwrap()
            .into_iter()
            .map(|r| r.document.id)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_hnsw_store() {
        let mut config = store_config();
        config.index_factory = IndexFactory::Hnsw;
        let embedder = hashing_embedder();

        let mut store = VectorDocumentStore::new(&config).unwrap();
        store.write_documents(corpus()).unwrap();
        store.update_embeddings(&embedder).unwrap();

        let query = embedder.embed_query("Dragons breathe fire over the narrow sea").unwrap();
        let results = store.query_by_embedding(&query, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].document.content.starts_with("Dragons"));
    }

    #[test]
    fn test_hnsw_requires_cosine() {
        let mut config = store_config();
        config.index_factory = IndexFactory::Hnsw;
        config.similarity = Similarity::DotProduct;
        assert!(VectorDocumentStore::new(&config).is_err());
    }

    #[test]
    fn test_unscaled_dot_product() {
        let mut config = store_config();
        config.similarity = Similarity::DotProduct;
        config.scale_score = false;
        let embedder = hashing_embedder();

        let mut store = VectorDocumentStore::new(&config).unwrap();
        store.write_documents(corpus()).unwrap();
        store.update_embeddings(&embedder).unwrap();

        let query = embedder.embed_query("Jon Snow is the bastard son of Ned Stark").unwrap();
        let results = store.query_by_embedding(&query, 1).unwrap();
        // Hashing vectors are unit length, so a self-match scores 1
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }
}
