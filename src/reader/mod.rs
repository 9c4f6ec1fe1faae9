//! Readers: extract answer spans from documents
//!
//! Every reader works sentence by sentence. A sentence gets a relevance score
//! (term overlap for [`LexicalReader`], a cross-encoder for
//! [`CrossEncoderReader`]); the answer inside it is the run of new words
//! nearest to the question's words. Answers from all documents are merged
//! and ranked by confidence.

mod cross_encoder;
mod lexical;
mod span;

pub use cross_encoder::CrossEncoderReader;
pub use lexical::LexicalReader;

use crate::config::{ReaderBackend, ReaderConfig};
use crate::document::{split_sentences, Answer, Document};
use crate::error::Result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("top_k must be greater than 0")]
    InvalidTopK,

    #[error("Reader initialization failed: {0}")]
    InitializationError(String),

    #[error("Reader inference failed: {0}")]
    InferenceError(String),
}

/// Extracts answers to a question from a set of documents
pub trait Reader {
    /// Return at most `top_k` answers across all `documents`, most confident first
    fn predict(&self, question: &str, documents: &[Document], top_k: usize) -> Result<Vec<Answer>>;
}

impl Reader for Box<dyn Reader> {
    fn predict(&self, question: &str, documents: &[Document], top_k: usize) -> Result<Vec<Answer>> {
        (**self).predict(question, documents, top_k)
    }
}

/// Span length and context size shared by all readers
#[derive(Debug, Clone, Copy)]
pub struct SpanParams {
    /// Longest answer, in words
    pub max_answer_len: usize,
    /// Characters of context kept around an answer
    pub context_window: usize,
}

impl From<&ReaderConfig> for SpanParams {
    fn from(config: &ReaderConfig) -> Self {
        Self {
            max_answer_len: config.max_answer_len,
            context_window: config.context_window,
        }
    }
}

/// Resolve the configured reader backend
///
/// The cross-encoder model is downloaded on first use.
pub fn build_reader(config: &ReaderConfig) -> std::result::Result<Box<dyn Reader>, ReaderError> {
    let params = SpanParams::from(config);
    match config.backend {
        ReaderBackend::Lexical => Ok(Box::new(LexicalReader::new(params))),
        ReaderBackend::CrossEncoder => Ok(Box::new(CrossEncoderReader::new(&config.model, params)?)),
    }
}

/// One sentence of a document, tokenised
pub(crate) struct Sentence {
    pub text_start: usize,
    pub text_end: usize,
    pub tokens: Vec<span::Token>,
}

/// Run span extraction over `documents`
///
/// `relevance` scores every sentence of one document against the question;
/// sentences scoring 0 or less produce no answer.
pub(crate) fn extract_answers<F>(
    question: &str,
    documents: &[Document],
    top_k: usize,
    params: SpanParams,
    mut relevance: F,
) -> Result<Vec<Answer>>
where
    F: FnMut(&Document, &[Sentence], &ahash::AHashSet<String>) -> Result<Vec<f32>>,
{
    if top_k == 0 {
        return Err(ReaderError::InvalidTopK.into());
    }

    let terms = span::question_terms(question);
    if question.trim().is_empty() || documents.is_empty() {
        return Ok(Vec::new());
    }

    let mut answers = Vec::new();
    for document in documents {
        let sentences: Vec<Sentence> = split_sentences(&document.content)
            .into_iter()
            .map(|range| Sentence {
                tokens: span::tokenize(&document.content[range.clone()], range.start),
                text_start: range.start,
                text_end: range.end,
            })
            .collect();
        if sentences.is_empty() {
            continue;
        }

        let scores = relevance(document, &sentences, &terms)?;
        for (sentence, score) in sentences.iter().zip(scores) {
            if score <= 0.0 {
                continue;
            }
            if let Some(candidate) =
                span::best_span(&sentence.tokens, &terms, params.max_answer_len)
            {
                answers.push(span::make_answer(
                    document,
                    candidate.start,
                    candidate.end,
                    candidate.confidence(score),
                    params.context_window,
                ));
            }
        }
    }

    tracing::debug!(
        "Extracted {} candidate answers from {} documents",
        answers.len(),
        documents.len()
    );

    Ok(span::rank(answers, top_k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;

    #[test]
    fn test_build_lexical_reader() {
        let reader = build_reader(&ReaderConfig::default()).unwrap();
        let docs = vec![Document::from_text("The sky is blue.")];
        let answers = reader.predict("What color is the sky?", &docs, 1).unwrap();
        assert_eq!(answers[0].answer, "blue");
    }

    #[test]
    fn test_build_unknown_cross_encoder() {
        let config = ReaderConfig {
            backend: ReaderBackend::CrossEncoder,
            model: "not-a-model".to_string(),
            ..ReaderConfig::default()
        };
        assert!(matches!(
            build_reader(&config),
            Err(ReaderError::InitializationError(_))
        ));
    }
}
