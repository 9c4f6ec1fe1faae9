//! Sentence relevance from a FastEmbed cross-encoder

use super::{extract_answers, Reader, ReaderError, SpanParams};
use crate::document::{Answer, Document};
use crate::error::Result;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::Arc;

/// Supported cross-encoder models: (name, model)
const SUPPORTED_MODELS: &[(&str, RerankerModel)] = &[
    ("bge-reranker-base", RerankerModel::BGERerankerBase),
    ("bge-reranker-v2-m3", RerankerModel::BGERerankerV2M3),
    ("jina-reranker-v1-turbo-en", RerankerModel::JINARerankerV1TurboEn),
];

/// Reader that ranks sentences with a cross-encoder
///
/// The model scores each (question, sentence) pair; the score is squashed
/// with a sigmoid and the answer span is then extracted the same way as in
/// [`super::LexicalReader`].
pub struct CrossEncoderReader {
    model: Arc<TextRerank>,
    model_name: String,
    params: SpanParams,
}

impl CrossEncoderReader {
    /// Create a reader with the named model
    ///
    /// # Arguments
    /// * `model_name` - Model name (e.g., "bge-reranker-base")
    /// * `params` - Answer length and context size
    pub fn new(model_name: &str, params: SpanParams) -> std::result::Result<Self, ReaderError> {
        let Some((name, model)) = SUPPORTED_MODELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(model_name))
            .cloned()
        else {
            let supported: Vec<&str> = SUPPORTED_MODELS.iter().map(|(n, _)| *n).collect();
            return Err(ReaderError::InitializationError(format!(
                "Unsupported cross-encoder: {}. Supported: {}",
                model_name,
                supported.join(", ")
            )));
        };

        tracing::info!("Initializing cross-encoder model: {}", name);

        let init_options = RerankInitOptions::new(model).with_show_download_progress(true);
        let model = TextRerank::try_new(init_options)
            .map_err(|e| ReaderError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: name.to_string(),
            params,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Score every sentence against the question, in input order
    fn score(&self, question: &str, sentences: Vec<&str>) -> std::result::Result<Vec<f32>, ReaderError> {
        let count = sentences.len();
        let results = self
            .model
            .rerank(question, sentences, false, None)
            .map_err(|e| ReaderError::InferenceError(e.to_string()))?;

        let mut scores = vec![0.0; count];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = sigmoid(result.score);
            }
        }
        Ok(scores)
    }
}

impl Reader for CrossEncoderReader {
    fn predict(&self, question: &str, documents: &[Document], top_k: usize) -> Result<Vec<Answer>> {
        extract_answers(question, documents, top_k, self.params, |document, sentences, _| {
            let texts: Vec<&str> = sentences
                .iter()
                .map(|s| &document.content[s.text_start..s.text_end])
                .collect();
            Ok(self.score(question, texts)?)
        })
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
