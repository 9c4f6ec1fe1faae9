//! Document stores
//!
//! Two stores share one contract:
//! - [`InMemoryDocumentStore`] keeps documents in memory with an optional
//!   BM25 keyword index
//! - [`VectorDocumentStore`] adds per-document embeddings, a similarity
//!   index, and persistence to a single SQLite file
//!
//! Documents are returned in insertion order. Writing a document whose id is
//! already present is resolved by the store's [`DuplicatePolicy`].

mod memory;
mod persistence;
mod vector;

pub use memory::InMemoryDocumentStore;
pub use vector::VectorDocumentStore;

use crate::document::{Document, DocumentId};
use crate::error::{QaError, Result};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// What to do when a written document's id is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the stored document (keeps its position)
    #[default]
    Overwrite,
    /// Keep the stored document, drop the new one
    Skip,
    /// Reject the whole write
    Fail,
}

impl DuplicatePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overwrite" => Some(Self::Overwrite),
            "skip" => Some(Self::Skip),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
            Self::Fail => "fail",
        }
    }
}

/// Outcome of a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub overwritten: usize,
    pub skipped: usize,
}

/// Common store contract
pub trait DocumentStore {
    /// Add documents, resolving id collisions with the store's policy
    fn write_documents(&mut self, documents: Vec<Document>) -> Result<WriteSummary>;

    /// Every stored document, in insertion order
    fn get_all_documents(&self) -> &[Document];

    fn get_document_by_id(&self, id: &DocumentId) -> Option<&Document>;

    fn get_document_count(&self) -> usize {
        self.get_all_documents().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Upsert {
    Inserted(usize),
    Overwritten(usize),
    Skipped,
}

/// Ordered documents with an id lookup, shared by both stores
#[derive(Debug, Default)]
pub(crate) struct DocumentCollection {
    documents: Vec<Document>,
    positions: AHashMap<DocumentId, usize>,
}

impl DocumentCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reject the batch if any id repeats, within it or against the store
    pub(crate) fn check_unique(&self, documents: &[Document]) -> Result<()> {
        let mut seen = AHashSet::with_capacity(documents.len());
        for doc in documents {
            if self.positions.contains_key(&doc.id) || !seen.insert(&doc.id) {
                return Err(QaError::DuplicateDocument {
                    id: doc.id.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn upsert(&mut self, document: Document, policy: DuplicatePolicy) -> Result<Upsert> {
        match self.positions.get(&document.id).copied() {
            None => {
                let position = self.documents.len();
                self.positions.insert(document.id.clone(), position);
                self.documents.push(document);
                Ok(Upsert::Inserted(position))
            }
            Some(position) => match policy {
                DuplicatePolicy::Overwrite => {
                    self.documents[position] = document;
                    Ok(Upsert::Overwritten(position))
                }
                DuplicatePolicy::Skip => {
                    tracing::debug!("Skipping duplicate document {}", document.id);
                    Ok(Upsert::Skipped)
                }
                DuplicatePolicy::Fail => Err(QaError::DuplicateDocument {
                    id: document.id.to_string(),
                }),
            },
        }
    }

    /// Write a batch, returning per-document outcomes
    pub(crate) fn write(
        &mut self,
        documents: Vec<Document>,
        policy: DuplicatePolicy,
    ) -> Result<(WriteSummary, Vec<Upsert>)> {
        if policy == DuplicatePolicy::Fail {
            self.check_unique(&documents)?;
        }

        let mut summary = WriteSummary::default();
        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let outcome = self.upsert(document, policy)?;
            match outcome {
                Upsert::Inserted(_) => summary.written += 1,
                Upsert::Overwritten(_) => summary.overwritten += 1,
                Upsert::Skipped => summary.skipped += 1,
            }
            outcomes.push(outcome);
        }

        Ok((summary, outcomes))
    }

    pub(crate) fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.positions.get(id).map(|&pos| &self.documents[pos])
    }

    pub(crate) fn at(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    pub(crate) fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.documents.iter_mut()
    }
}
