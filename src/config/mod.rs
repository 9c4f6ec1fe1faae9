//! Configuration management for docqa
//!
//! Every tunable the pipelines use (paths, model names, top-k values,
//! similarity settings) lives here, is loaded once at startup from TOML,
//! optionally adjusted by environment variables and a profile, and then
//! validated before anything is built from it.

use crate::document::{LoaderConfig, SplitMode};
use crate::embedding::{HnswParams, IndexFactory, Similarity};
use crate::error::{QaError, Result};
use crate::output::Details;
use crate::store::DuplicatePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub data: DataConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub retriever: RetrieverConfig,
    pub reader: ReaderConfig,
    pub output: OutputConfig,
    pub repl: ReplConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Document corpus location and splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub doc_dir: PathBuf,
    #[serde(flatten)]
    pub loader: LoaderConfig,
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// What to do when a written document's id already exists
    pub duplicate_documents: DuplicatePolicy,
    /// Where the vector store is persisted
    pub index_path: PathBuf,
    pub similarity: Similarity,
    pub index_factory: IndexFactory,
    pub hnsw: HnswParams,
    /// Map raw similarities into [0, 1]
    pub scale_score: bool,
}

/// Which embedding implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    FastEmbed,
    Hashing,
}

impl EmbeddingBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fastembed" => Some(Self::FastEmbed),
            "hashing" => Some(Self::Hashing),
            _ => None,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// FastEmbed model name (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Vector size for the hashing backend
    pub dimension: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::FastEmbed,
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 32,
        }
    }
}

/// How many documents retrievers return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    pub bm25_top_k: usize,
    pub embedding_top_k: usize,
}

/// Which reader implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderBackend {
    /// Term-overlap sentence scoring
    Lexical,
    /// Cross-encoder sentence scoring via fastembed
    CrossEncoder,
}

impl ReaderBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lexical" => Some(Self::Lexical),
            "cross_encoder" => Some(Self::CrossEncoder),
            _ => None,
        }
    }
}

/// Reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub backend: ReaderBackend,
    /// Cross-encoder model name
    pub model: String,
    /// Answers returned after retrieval (`ask`)
    pub top_k: usize,
    /// Answers returned when reading every document (`read`)
    pub standalone_top_k: usize,
    /// Longest answer, in words
    pub max_answer_len: usize,
    /// Characters of context kept around an answer
    pub context_window: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            backend: ReaderBackend::Lexical,
            model: "bge-reranker-base".to_string(),
            top_k: 5,
            standalone_top_k: 3,
            max_answer_len: 15,
            context_window: 150,
        }
    }
}

/// Result printing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub details: Details,
    /// Characters of document content shown by `search`
    pub preview_chars: usize,
}

/// Interactive loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    pub prompt: String,
    /// Input that ends a `search` session
    pub quit_command: String,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bm25_top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader_top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_backend: Option<EmbeddingBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader_backend: Option<ReaderBackend>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QaError::io(e, format!("Failed to read config file: {:?}", path)))?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| QaError::io(e, format!("Failed to write config file: {:?}", path)))?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| QaError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(k) = overrides.bm25_top_k {
            self.retriever.bm25_top_k = k;
        }
        if let Some(k) = overrides.embedding_top_k {
            self.retriever.embedding_top_k = k;
        }
        if let Some(k) = overrides.reader_top_k {
            self.reader.top_k = k;
        }
        if let Some(backend) = overrides.embedding_backend {
            self.embedding.backend = backend;
        }
        if let Some(backend) = overrides.reader_backend {
            self.reader.backend = backend;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCQA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Apply `DOCQA_`-prefixed `(key, value)` overrides; other keys are ignored
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("DOCQA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "DATA__DOC_DIR" => self.data.doc_dir = PathBuf::from(value),
            "DATA__SPLIT_MODE" => {
                self.data.loader.split_mode = parse_choice(path, value, SplitMode::parse)?;
            }
            "STORE__INDEX_PATH" => self.store.index_path = PathBuf::from(value),
            "STORE__DUPLICATE_DOCUMENTS" => {
                self.store.duplicate_documents = parse_choice(path, value, DuplicatePolicy::parse)?;
            }
            "STORE__SIMILARITY" => {
                self.store.similarity = parse_choice(path, value, Similarity::parse)?;
            }
            "STORE__INDEX_FACTORY" => {
                self.store.index_factory = parse_choice(path, value, IndexFactory::parse)?;
            }
            "EMBEDDING__BACKEND" => {
                self.embedding.backend = parse_choice(path, value, EmbeddingBackend::parse)?;
            }
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "RETRIEVER__BM25_TOP_K" => self.retriever.bm25_top_k = parse_number(path, value)?,
            "RETRIEVER__EMBEDDING_TOP_K" => {
                self.retriever.embedding_top_k = parse_number(path, value)?;
            }
            "READER__BACKEND" => {
                self.reader.backend = parse_choice(path, value, ReaderBackend::parse)?;
            }
            "READER__MODEL" => self.reader.model = value.to_string(),
            "READER__TOP_K" => self.reader.top_k = parse_number(path, value)?,
            "READER__STANDALONE_TOP_K" => {
                self.reader.standalone_top_k = parse_number(path, value)?;
            }
            "OUTPUT__DETAILS" => self.output.details = parse_choice(path, value, Details::parse)?,
            "OUTPUT__PREVIEW_CHARS" => self.output.preview_chars = parse_number(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| QaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("docqa").join("config.toml"))
    }
}

fn parse_number(path: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| QaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}' as a number", value),
    })
}

fn parse_choice<T>(path: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    parse(value).ok_or_else(|| QaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Unrecognized value '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            data: DataConfig {
                doc_dir: PathBuf::from("data"),
                loader: LoaderConfig::default(),
            },
            store: StoreConfig {
                duplicate_documents: DuplicatePolicy::Overwrite,
                index_path: PathBuf::from("idx.path"),
                similarity: Similarity::Cosine,
                index_factory: IndexFactory::Flat,
                hnsw: HnswParams::default(),
                scale_score: true,
            },
            embedding: EmbeddingConfig::default(),
            retriever: RetrieverConfig {
                bm25_top_k: 10,
                embedding_top_k: 3,
            },
            reader: ReaderConfig::default(),
            output: OutputConfig {
                details: Details::Minimum,
                preview_chars: 100,
            },
            repl: ReplConfig {
                prompt: "Q: ".to_string(),
                quit_command: "quit".to_string(),
            },
            profiles: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.retriever.bm25_top_k, 10);
        assert_eq!(config.retriever.embedding_top_k, 3);
        assert_eq!(config.reader.top_k, 5);
        assert_eq!(config.reader.standalone_top_k, 3);
        assert_eq!(config.store.index_path, PathBuf::from("idx.path"));
        assert_eq!(config.store.similarity, Similarity::Cosine);
        assert_eq!(config.store.index_factory, IndexFactory::Flat);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.retriever.bm25_top_k = 7;
        config.store.similarity = Similarity::DotProduct;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.retriever.bm25_top_k, 7);
        assert_eq!(loaded.store.similarity, Similarity::DotProduct);
        assert_eq!(loaded.data.loader.split_mode, SplitMode::Paragraph);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(&temp.path().join("missing.toml"));
        assert!(matches!(result, Err(QaError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_rejects_unknown_similarity() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let content = toml::to_string_pretty(&Config::default())
            .unwrap()
            .replace("similarity = \"cosine\"", "similarity = \"euclidean\"");
        std::fs::write(&path, content).unwrap();

        assert!(matches!(Config::load(&path), Err(QaError::Toml(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("DOCQA_RETRIEVER__BM25_TOP_K", "4"),
            ("DOCQA_EMBEDDING__BACKEND", "hashing"),
            ("DOCQA_OUTPUT__DETAILS", "medium"),
            ("DOCQA_STORE__DUPLICATE_DOCUMENTS", "skip"),
            ("DOCQA_READER__TOP_K", "not-a-number"),
            ("HOME", "/root"),
        ]));

        assert_eq!(config.retriever.bm25_top_k, 4);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Hashing);
        assert_eq!(config.output.details, Details::Medium);
        assert_eq!(config.store.duplicate_documents, DuplicatePolicy::Skip);
        // Unparseable values are ignored with a warning
        assert_eq!(config.reader.top_k, 5);
    }

    #[test]
    fn test_profiles() {
        let mut config = Config::default();
        config.profiles.insert(
            "offline".to_string(),
            ProfileOverrides {
                embedding_backend: Some(EmbeddingBackend::Hashing),
                reader_top_k: Some(1),
                ..ProfileOverrides::default()
            },
        );

        config.apply_profile("offline").unwrap();
        assert_eq!(config.embedding.backend, EmbeddingBackend::Hashing);
        assert_eq!(config.reader.top_k, 1);
        assert_eq!(config.retriever.bm25_top_k, 10);

        assert!(config.apply_profile("missing").is_err());
    }
}
