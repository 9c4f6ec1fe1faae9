use super::{extract_answers, span, Reader, SpanParams};
use crate::document::{Answer, Document};
use crate::error::Result;

/// Reader that scores sentences by how many question terms they contain
///
/// Needs no model, so it is deterministic and works offline.
pub struct LexicalReader {
    params: SpanParams,
}

impl LexicalReader {
    pub fn new(params: SpanParams) -> Self {
        Self { params }
    }
}

impl Reader for LexicalReader {
    fn predict(&self, question: &str, documents: &[Document], top_k: usize) -> Result<Vec<Answer>> {
        extract_answers(question, documents, top_k, self.params, |_, sentences, terms| {
            Ok(sentences
                .iter()
                .map(|s| span::term_overlap(&s.tokens, terms))
                .collect())
        })
    }
}
