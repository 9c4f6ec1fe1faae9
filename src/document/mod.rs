//! Documents, answers and the directory loader that produces them
//!
//! A [`Document`] is the unit of retrievable text. Its id is the BLAKE3 hash
//! of its content, so the same paragraph loaded twice maps to the same id.

mod loader;
mod preprocessor;

pub use loader::{convert_files_to_docs, LoaderConfig};
pub use preprocessor::{normalize_whitespace, split_paragraphs, split_sentences, split_words, SplitMode};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata attached to a document (file name, source path, split index)
pub type Meta = BTreeMap<String, serde_json::Value>;

/// Content-derived document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Hash `content` into an id
    pub fn from_content(content: &str) -> Self {
        Self(blake3::hash(content.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of retrievable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique id within a store
    pub id: DocumentId,

    /// Raw text content
    pub content: String,

    /// Source metadata (`name`, `source`, `split_id`)
    #[serde(default)]
    pub meta: Meta,

    /// Dense embedding, only populated by a vector store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Create a document, deriving its id from the content
    pub fn new(content: impl Into<String>, meta: Meta) -> Self {
        let content = content.into();
        Self {
            id: DocumentId::from_content(&content),
            content,
            meta,
            embedding: None,
        }
    }

    /// Create a document without metadata
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(content, Meta::new())
    }

    /// The first `max_chars` characters of the content
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }

    /// File name this document was loaded from, if known
    pub fn name(&self) -> Option<&str> {
        self.meta.get("name").and_then(|v| v.as_str())
    }
}

/// A document with a relevance score, produced per query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Relevance score, higher is better
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}

/// Character offsets `[start, end)` into some text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// An extracted answer span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Literal answer text as it appears in the document
    pub answer: String,

    /// Confidence in (0, 1]
    pub score: f32,

    /// Surrounding text the answer was found in
    pub context: String,

    /// Offsets of the answer within the document content (in chars)
    pub offsets_in_document: Span,

    /// Offsets of the answer within `context` (in chars)
    pub offsets_in_context: Span,

    /// Id of the source document
    pub document_id: DocumentId,

    /// Metadata copied from the source document
    #[serde(default)]
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_content_hash() {
        let a = Document::from_text("The sky is blue.");
        let b = Document::from_text("The sky is blue.");
        let c = Document::from_text("The grass is green.");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.as_str().len(), 64);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let doc = Document::from_text("héllo wörld");
        assert_eq!(doc.preview(5), "héllo");
        assert_eq!(doc.preview(100), "héllo wörld");
    }

    #[test]
    fn test_name_from_meta() {
        let mut meta = Meta::new();
        meta.insert("name".to_string(), serde_json::json!("got.txt"));
        let doc = Document::new("text", meta);
        assert_eq!(doc.name(), Some("got.txt"));
        assert_eq!(Document::from_text("text").name(), None);
    }
}
