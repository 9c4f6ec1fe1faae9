use super::{check_top_k, RetrievalError, Retriever};
use crate::document::ScoredDocument;
use crate::error::Result;
use crate::store::InMemoryDocumentStore;

/// Sparse keyword retriever
///
/// Deterministic for a fixed store state. The query is analysed like the
/// indexed text, so it is plain words only; there is no query syntax.
pub struct Bm25Retriever<'s> {
    store: &'s InMemoryDocumentStore,
}

impl<'s> Bm25Retriever<'s> {
    pub fn new(store: &'s InMemoryDocumentStore) -> std::result::Result<Self, RetrievalError> {
        if !store.bm25_enabled() {
            return Err(RetrievalError::KeywordSearchUnavailable);
        }
        Ok(Self { store })
    }
}

impl Retriever for Bm25Retriever<'_> {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        check_top_k(top_k)?;

        let results = self.store.query_bm25(query, top_k)?;
        tracing::debug!("BM25 returned {} documents for {:?}", results.len(), query);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::QaError;
    use crate::store::{DocumentStore, DuplicatePolicy};

    fn store() -> InMemoryDocumentStore {
        let mut store = InMemoryDocumentStore::with_bm25(DuplicatePolicy::Overwrite).unwrap();
        store
            .write_documents(vec![
                Document::from_text("The sky is blue."),
                Document::from_text("The grass is green."),
                Document::from_text("Snow is white in winter."),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_ranks_matching_document_first() {
        let store = store();
        let retriever = Bm25Retriever::new(&store).unwrap();

        let results = retriever.retrieve("What color is the sky?", 10).unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 10);
        assert_eq!(results[0].document.content, "The sky is blue.");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_respects_top_k() {
        let store = store();
        let retriever = Bm25Retriever::new(&store).unwrap();
        assert_eq!(retriever.retrieve("is", 2).unwrap().len(), 2);
    }

    #[test]
    fn test_is_deterministic() {
        let store = store();
        let retriever = Bm25Retriever::new(&store).unwrap();

        let ids = |results: Vec<ScoredDocument>| -> Vec<_> {
            results.into_iter().map(|r| r.document.id).collect()
        };
        let first = ids(retriever.retrieve("the sky and the grass", 3).unwrap());
        let second = ids(retriever.retrieve("the sky and the grass", 3).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_top_k() {
        let store = store();
        let retriever = Bm25Retriever::new(&store).unwrap();
        assert!(matches!(
            retriever.retrieve("sky", 0),
            Err(QaError::Retrieval(RetrievalError::InvalidTopK))
        ));
    }

    #[test]
    fn test_requires_bm25_store() {
        let store = InMemoryDocumentStore::new(DuplicatePolicy::Overwrite);
        assert!(matches!(
            Bm25Retriever::new(&store),
            Err(RetrievalError::KeywordSearchUnavailable)
        ));
    }
}
