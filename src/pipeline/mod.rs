//! Query-time pipelines
//!
//! Each pipeline is a fixed chain of components built once and then run per
//! query:
//! - [`ExtractiveQaPipeline`]: retriever → reader
//! - [`DocumentSearchPipeline`]: retriever only
//! - [`ReaderPipeline`]: every stored document → reader

use crate::document::{Answer, ScoredDocument};
use crate::error::Result;
use crate::reader::Reader;
use crate::retrieval::Retriever;
use crate::store::DocumentStore;
use serde::Serialize;

/// Result of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Prediction {
    pub query: String,
    /// Extracted answers, most confident first (empty for document search)
    pub answers: Vec<Answer>,
    /// Retrieved documents, best first (empty when no retriever ran)
    pub documents: Vec<ScoredDocument>,
}

/// A runnable query pipeline
pub trait Pipeline {
    fn run(&self, query: &str) -> Result<Prediction>;
}

/// Retrieve candidate documents, then extract answers from them
pub struct ExtractiveQaPipeline<R, D> {
    retriever: R,
    reader: D,
    retriever_top_k: usize,
    reader_top_k: usize,
}

impl<R: Retriever, D: Reader> ExtractiveQaPipeline<R, D> {
    pub fn new(retriever: R, reader: D, retriever_top_k: usize, reader_top_k: usize) -> Self {
        Self {
            retriever,
            reader,
            retriever_top_k,
            reader_top_k,
        }
    }
}

impl<R: Retriever, D: Reader> Pipeline for ExtractiveQaPipeline<R, D> {
    fn run(&self, query: &str) -> Result<Prediction> {
        let documents = self.retriever.retrieve(query, self.retriever_top_k)?;
        let candidates: Vec<_> = documents.iter().map(|d| d.document.clone()).collect();
        let answers = self.reader.predict(query, &candidates, self.reader_top_k)?;

        Ok(Prediction {
            query: query.to_string(),
            answers,
            documents,
        })
    }
}

/// Retrieve documents only
pub struct DocumentSearchPipeline<R> {
    retriever: R,
    top_k: usize,
}

impl<R: Retriever> DocumentSearchPipeline<R> {
    pub fn new(retriever: R, top_k: usize) -> Self {
        Self { retriever, top_k }
    }
}

impl<R: Retriever> Pipeline for DocumentSearchPipeline<R> {
    fn run(&self, query: &str) -> Result<Prediction> {
        let documents = self.retriever.retrieve(query, self.top_k)?;
        Ok(Prediction {
            query: query.to_string(),
            answers: Vec::new(),
            documents,
        })
    }
}

/// Run a reader over every document in a store, without retrieval
pub struct ReaderPipeline<'s, S, D> {
    store: &'s S,
    reader: D,
    top_k: usize,
}

impl<'s, S: DocumentStore, D: Reader> ReaderPipeline<'s, S, D> {
    pub fn new(store: &'s S, reader: D, top_k: usize) -> Self {
        Self {
            store,
            reader,
            top_k,
        }
    }
}

impl<S: DocumentStore, D: Reader> Pipeline for ReaderPipeline<'_, S, D> {
    fn run(&self, query: &str) -> Result<Prediction> {
        let answers = self
            .reader
            .predict(query, self.store.get_all_documents(), self.top_k)?;
        Ok(Prediction {
            query: query.to_string(),
            answers,
            documents: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::reader::{LexicalReader, SpanParams};
    use crate::retrieval::Bm25Retriever;
    use crate::store::{DuplicatePolicy, InMemoryDocumentStore};

    fn reader() -> LexicalReader {
        LexicalReader::new(SpanParams {
            max_answer_len: 15,
            context_window: 150,
        })
    }

    fn store() -> InMemoryDocumentStore {
        let mut store = InMemoryDocumentStore::with_bm25(DuplicatePolicy::Overwrite).unwrap();
        store
            .write_documents(vec![
                Document::from_text("The sky is blue."),
                Document::from_text("The grass is green."),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_extractive_qa() {
        let store = store();
        let pipeline =
            ExtractiveQaPipeline::new(Bm25Retriever::new(&store).unwrap(), reader(), 10, 5);

        let prediction = pipeline.run("What color is the sky?").unwrap();
        assert_eq!(prediction.query, "What color is the sky?");
        assert_eq!(prediction.documents.len(), 2);
        assert_eq!(prediction.answers[0].answer, "blue");
        assert!(prediction.answers.len() <= 5);
    }

    #[test]
    fn test_document_search() {
        let store = store();
        let pipeline = DocumentSearchPipeline::new(Bm25Retriever::new(&store).unwrap(), 1);

        let prediction = pipeline.run("green grass").unwrap();
        assert!(prediction.answers.is_empty());
        assert_eq!(prediction.documents.len(), 1);
        assert_eq!(prediction.documents[0].document.content, "The grass is green.");
    }

    #[test]
    fn test_reader_only() {
        let store = store();
        let pipeline = ReaderPipeline::new(&store, reader(), 3);

        let prediction = pipeline.run("What color is the grass?").unwrap();
        assert!(prediction.documents.is_empty());
        assert_eq!(prediction.answers[0].answer, "green");
    }

    #[test]
    fn test_boxed_reader() {
        let store = store();
        let boxed: Box<dyn Reader> = Box::new(reader());
        let pipeline = ReaderPipeline::new(&store, boxed, 1);

        assert_eq!(pipeline.run("What color is the sky?").unwrap().answers.len(), 1);
    }
}
