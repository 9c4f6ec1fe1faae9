use super::{DocumentCollection, DocumentStore, DuplicatePolicy, Upsert, WriteSummary};
use crate::document::{Document, DocumentId, ScoredDocument};
use crate::embedding::KeywordIndex;
use crate::error::{QaError, Result};

/// Documents held in memory, optionally BM25-searchable
///
/// Nothing is persisted; the store lives as long as the process.
pub struct InMemoryDocumentStore {
    documents: DocumentCollection,
    policy: DuplicatePolicy,
    bm25: Option<KeywordIndex>,
}

impl InMemoryDocumentStore {
    /// Create a store without a keyword index
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            documents: DocumentCollection::new(),
            policy,
            bm25: None,
        }
    }

    /// Create a store that maintains a BM25 index over document content
    pub fn with_bm25(policy: DuplicatePolicy) -> Result<Self> {
        Ok(Self {
            documents: DocumentCollection::new(),
            policy,
            bm25: Some(KeywordIndex::in_memory()?),
        })
    }

    pub fn bm25_enabled(&self) -> bool {
        self.bm25.is_some()
    }

    /// Rank stored documents against a free-text query with BM25
    ///
    /// # Returns
    /// At most `top_k` documents, best first. Documents sharing no term with
    /// the query are not returned.
    pub fn query_bm25(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let index = self
            .bm25
            .as_ref()
            .ok_or_else(|| QaError::Config("BM25 is not enabled for this store".to_string()))?;

        let hits = index.search(query, top_k)?;
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.documents.get(&DocumentId::from(hit.id.as_str())) {
                Some(doc) => results.push(ScoredDocument::new(doc.clone(), hit.score)),
                None => tracing::warn!("Keyword index returned unknown document {}", hit.id),
            }
        }

        Ok(results)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn write_documents(&mut self, documents: Vec<Document>) -> Result<WriteSummary> {
        let (summary, outcomes) = self.documents.write(documents, self.policy)?;

        if let Some(index) = self.bm25.as_mut() {
            for outcome in outcomes {
                let position = match outcome {
                    Upsert::Inserted(pos) => pos,
                    Upsert::Overwritten(pos) => pos,
                    Upsert::Skipped => continue,
                };
                if let Some(doc) = self.documents.at(position) {
                    if matches!(outcome, Upsert::Overwritten(_)) {
                        index.delete(doc.id.as_str());
                    }
                    index.insert(doc.id.as_str(), &doc.content)?;
                }
            }
            index.commit()?;
        }

        tracing::debug!(
            "Wrote {} documents ({} overwritten, {} skipped)",
            summary.written,
            summary.overwritten,
            summary.skipped
        );

        Ok(summary)
    }

    fn get_all_documents(&self) -> &[Document] {
        self.documents.as_slice()
    }

    fn get_document_by_id(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }
}
