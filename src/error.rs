use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::{EmbeddingError, KeywordIndexError, VectorIndexError};
use crate::reader::ReaderError;
use crate::retrieval::RetrievalError;

/// Main error type for docqa
#[derive(Error, Debug)]
pub enum QaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Document directory missing or not a directory
    #[error("Document directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A document with the same id is already stored
    #[error("Duplicate document id: {id}")]
    DuplicateDocument { id: String },

    /// Persisted vector index could not be restored
    #[error("Failed to load index from {path}: {message}")]
    IndexLoad { path: PathBuf, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    KeywordIndex(#[from] KeywordIndexError),

    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QaError {
    /// Wrap an IO error with a description of what was being attempted
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for docqa operations
pub type Result<T> = std::result::Result<T, QaError>;
