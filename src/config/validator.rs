use crate::config::{Config, EmbeddingBackend, ReaderBackend, SCHEMA_VERSION};
use crate::embedding::{IndexFactory, Similarity};
use crate::error::{QaError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every violation
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_data(config, &mut errors);
        Self::validate_store(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retriever(config, &mut errors);
        Self::validate_reader(config, &mut errors);
        Self::validate_output(config, &mut errors);
        Self::validate_repl(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(QaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_data(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.data.doc_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "data.doc_dir",
                "Document directory cannot be empty",
            ));
        }

        if config.data.loader.split_length == 0 {
            errors.push(ValidationError::new(
                "data.split_length",
                "Split length must be greater than 0",
            ));
        }

        if config.data.loader.extensions.is_empty() {
            errors.push(ValidationError::new(
                "data.extensions",
                "At least one file extension is required",
            ));
        }
    }

    fn validate_store(config: &Config, errors: &mut Vec<ValidationError>) {
        let store = &config.store;

        if store.index_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "store.index_path",
                "Index path cannot be empty",
            ));
        }

        if store.index_factory == IndexFactory::Hnsw && store.similarity != Similarity::Cosine {
            errors.push(ValidationError::new(
                "store.index_factory",
                format!(
                    "'hnsw' requires cosine similarity, got '{}'",
                    store.similarity.as_str()
                ),
            ));
        }

        if store.hnsw.m == 0 {
            errors.push(ValidationError::new(
                "store.hnsw.m",
                "HNSW M must be greater than 0",
            ));
        }

        if store.hnsw.ef_construction == 0 || store.hnsw.ef_search == 0 {
            errors.push(ValidationError::new(
                "store.hnsw",
                "HNSW ef_construction and ef_search must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let embedding = &config.embedding;

        if embedding.backend == EmbeddingBackend::FastEmbed && embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Dimension must be greater than 0",
            ));
        }

        if embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retriever(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retriever.bm25_top_k == 0 {
            errors.push(ValidationError::new(
                "retriever.bm25_top_k",
                "top_k must be greater than 0",
            ));
        }

        if config.retriever.embedding_top_k == 0 {
            errors.push(ValidationError::new(
                "retriever.embedding_top_k",
                "top_k must be greater than 0",
            ));
        }
    }

    fn validate_reader(config: &Config, errors: &mut Vec<ValidationError>) {
        let reader = &config.reader;

        if reader.top_k == 0 {
            errors.push(ValidationError::new(
                "reader.top_k",
                "top_k must be greater than 0",
            ));
        }

        if reader.standalone_top_k == 0 {
            errors.push(ValidationError::new(
                "reader.standalone_top_k",
                "top_k must be greater than 0",
            ));
        }

        if reader.max_answer_len == 0 {
            errors.push(ValidationError::new(
                "reader.max_answer_len",
                "Maximum answer length must be greater than 0",
            ));
        }

        if reader.backend == ReaderBackend::CrossEncoder && reader.model.is_empty() {
            errors.push(ValidationError::new(
                "reader.model",
                "Cross-encoder model name cannot be empty",
            ));
        }
    }

    fn validate_output(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.output.preview_chars == 0 {
            errors.push(ValidationError::new(
                "output.preview_chars",
                "Preview length must be greater than 0",
            ));
        }
    }

    fn validate_repl(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.repl.quit_command.trim().is_empty() {
            errors.push(ValidationError::new(
                "repl.quit_command",
                "Quit command cannot be blank",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(QaError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = Config::default();
        config.retriever.bm25_top_k = 0;
        config.reader.top_k = 0;

        let paths = error_paths(&config);
        assert!(paths.contains(&"retriever.bm25_top_k".to_string()));
        assert!(paths.contains(&"reader.top_k".to_string()));
    }

    #[test]
    fn test_hnsw_requires_cosine() {
        let mut config = Config::default();
        config.store.index_factory = IndexFactory::Hnsw;
        config.store.similarity = Similarity::DotProduct;
        assert_eq!(error_paths(&config), vec!["store.index_factory".to_string()]);

        config.store.similarity = Similarity::Cosine;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_paths() {
        let mut config = Config::default();
        config.data.doc_dir = PathBuf::new();
        config.store.index_path = PathBuf::new();
        assert_eq!(error_paths(&config).len(), 2);
    }

    #[test]
    fn test_empty_model_only_matters_for_fastembed() {
        let mut config = Config::default();
        config.embedding.model = String::new();
        assert!(ConfigValidator::validate(&config).is_err());

        config.embedding.backend = EmbeddingBackend::Hashing;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_blank_quit_command() {
        let mut config = Config::default();
        config.repl.quit_command = "  ".to_string();
        assert_eq!(error_paths(&config), vec!["repl.quit_command".to_string()]);
    }
}
