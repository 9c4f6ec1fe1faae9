/// Tantivy keyword index for BM25 full-text search
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::TokenStream;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeywordIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),
}

/// Search result with document ID and relevance score
#[derive(Debug, Clone)]
pub struct KeywordSearchResult {
    /// Id of the matching document
    pub id: String,
    /// BM25 relevance score
    pub score: f32,
}

/// In-memory Tantivy index wrapper
///
/// Provides full-text search with BM25 ranking. Only ids are stored; the
/// owning document store keeps the content.
pub struct KeywordIndex {
    index: Index,
    reader: IndexReader,
    writer: IndexWriter,
    id_field: Field,
    text_field: Field,
}

impl KeywordIndex {
    /// Create an empty index held in RAM
    pub fn in_memory() -> Result<Self, KeywordIndexError> {
        let mut schema_builder = Schema::builder();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let text_field = schema_builder.add_text_field("text", TEXT);

        let schema = schema_builder.build();
        let index = Index::create_in_ram(schema);

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        // Reloaded explicitly after each commit so searches see every write
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| KeywordIndexError::InitializationError(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer,
            id_field,
            text_field,
        })
    }

    /// Queue a document for indexing (visible after [`Self::commit`])
    pub fn insert(&mut self, id: &str, text: &str) -> Result<(), KeywordIndexError> {
        let doc = doc!(
            self.id_field => id,
            self.text_field => text,
        );

        self.writer
            .add_document(doc)
            .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

        Ok(())
    }

    /// Queue removal of a document by ID
    pub fn delete(&mut self, id: &str) {
        let term = Term::from_field_text(self.id_field, id);
        self.writer.delete_term(term);
    }

    /// Commit all pending changes and refresh the reader
    pub fn commit(&mut self) -> Result<(), KeywordIndexError> {
        self.writer
            .commit()
            .map_err(|e| KeywordIndexError::InsertError(e.to_string()))?;

        self.reader
            .reload()
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        Ok(())
    }

    /// Search the index
    ///
    /// The query is free text: it is tokenized with the same analyzer as the
    /// indexed content and every term is OR-ed, so punctuation such as `?`
    /// never causes a parse error.
    ///
    /// # Returns
    /// Results sorted by BM25 score, highest first, at most `limit` long
    pub fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordSearchResult>, KeywordIndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let terms = self.query_terms(query)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|term| {
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let retrieved_doc: tantivy::TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| KeywordIndexError::SearchError(e.to_string()))?;

            let id = retrieved_doc
                .get_first(self.id_field)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    KeywordIndexError::SearchError("Missing or invalid ID field".to_string())
                })?
                .to_string();

            results.push(KeywordSearchResult { id, score });
        }

        Ok(results)
    }

    fn query_terms(&self, query: &str) -> Result<Vec<Term>, KeywordIndexError> {
        let mut analyzer = self.index.tokenizer_for_field(self.text_field)?;
        let mut seen = ahash::AHashSet::new();
        let mut terms = Vec::new();

        let mut stream = analyzer.token_stream(query);
        stream.process(&mut |token| {
            if seen.insert(token.text.clone()) {
                terms.push(Term::from_field_text(self.text_field, &token.text));
            }
        });

        Ok(terms)
    }

    /// Get the number of committed documents in the index
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_creation() {
        let index = KeywordIndex::in_memory().unwrap();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_and_search() {
        let mut index = KeywordIndex::in_memory().unwrap();

        index
            .insert("a", "The quick brown fox jumps over the lazy dog")
            .unwrap();
        index
            .insert("b", "A fast red fox leaps above a sleepy canine")
            .unwrap();
        index.insert("c", "Rust programming language tutorial").unwrap();
        index.commit().unwrap();

        assert_eq!(index.len(), 3);

        let results = index.search("fox", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].id == "a" || results[0].id == "b");

        let results = index.search("RUST?", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "c");
    }

    #[test]
    fn test_free_text_query_ranks_overlap() {
        let mut index = KeywordIndex::in_memory().unwrap();
        index.insert("sky", "The sky is blue.").unwrap();
        index.insert("grass", "The grass is green.").unwrap();
        index.commit().unwrap();

        let results = index.search("What color is the sky?", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "sky");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_limit_and_empty_query() {
        let mut index = KeywordIndex::in_memory().unwrap();
        for i in 0..5 {
            index.insert(&i.to_string(), "shared words here").unwrap();
        }
        index.commit().unwrap();

        assert_eq!(index.search("shared", 3).unwrap().len(), 3);
        assert!(index.search("shared", 0).unwrap().is_empty());
        assert!(index.search("  ?! ", 10).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let mut index = KeywordIndex::in_memory().unwrap();

        index.insert("1", "Document one").unwrap();
        index.insert("2", "Document two").unwrap();
        index.commit().unwrap();
        assert_eq!(index.len(), 2);

        index.delete("1");
        index.commit().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.search("one", 10).unwrap().len(), 0);
    }
}
