//! Directory loader turning text files into documents

use super::preprocessor::{
    normalize_whitespace, split_paragraphs, split_sentences, split_words, SplitMode,
};
use super::{Document, Meta};
use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options controlling how files become documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub split_mode: SplitMode,
    /// Words per document in `word` mode
    pub split_length: usize,
    /// Keep sentences whole in `word` mode
    pub split_respect_sentence_boundary: bool,
    /// File extensions (without the dot) that are loaded
    pub extensions: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::Paragraph,
            split_length: 200,
            split_respect_sentence_boundary: true,
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}

impl LoaderConfig {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Convert every supported file directly inside `dir` into documents
///
/// Files are visited in name order. Hidden files and subdirectories are
/// skipped; files with an unsupported extension are skipped with a warning.
pub fn convert_files_to_docs(dir: &Path, config: &LoaderConfig) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(QaError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let files = list_files(dir)?;
    let mut documents = Vec::new();

    for path in files {
        if !config.accepts(&path) {
            warn!("Skipping {}: unsupported file type", path.display());
            continue;
        }

        let text = std::fs::read_to_string(&path)
            .map_err(|e| QaError::io(e, format!("Failed to read {}", path.display())))?;

        let segments = split_text(&text, config);
        debug!("Converted {} into {} documents", path.display(), segments.len());

        let split = config.split_mode != SplitMode::None;
        for (split_id, segment) in segments.into_iter().enumerate() {
            documents.push(Document::new(segment, file_meta(&path, split.then_some(split_id))));
        }
    }

    info!(
        "Converted files in {} into {} documents",
        dir.display(),
        documents.len()
    );

    Ok(documents)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| QaError::io(e, format!("Failed to list {}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| QaError::io(e, format!("Failed to list {}", dir.display())))?;
        let path = entry.path();

        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !path.is_file() {
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

fn split_text(text: &str, config: &LoaderConfig) -> Vec<String> {
    match config.split_mode {
        SplitMode::None => {
            let cleaned = normalize_whitespace(text);
            if cleaned.is_empty() {
                Vec::new()
            } else {
                vec![cleaned]
            }
        }
        SplitMode::Paragraph => {
            let mut paragraphs = split_paragraphs(text);
            if paragraphs.len() == 1 {
                // No blank lines: a single-paragraph file is split by sentence
                let paragraph = paragraphs.remove(0);
                return split_sentences(&paragraph)
                    .into_iter()
                    .map(|range| paragraph[range].to_string())
                    .collect();
            }
            paragraphs
        }
        SplitMode::Word => split_words(
            text,
            config.split_length,
            config.split_respect_sentence_boundary,
        ),
    }
}

fn file_meta(path: &Path, split_id: Option<usize>) -> Meta {
    let mut meta = Meta::new();
    if let Some(name) = path.file_name() {
        meta.insert(
            "name".to_string(),
            serde_json::Value::String(name.to_string_lossy().into_owned()),
        );
    }
    meta.insert(
        "source".to_string(),
        serde_json::Value::String(path.display().to_string()),
    );
    if let Some(split_id) = split_id {
        meta.insert("split_id".to_string(), serde_json::json!(split_id));
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = convert_files_to_docs(&temp.path().join("nope"), &LoaderConfig::default());
        assert!(matches!(result, Err(QaError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_paragraph_split() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.txt", "The sky is blue.\n\nThe grass is green.\n");

        let docs = convert_files_to_docs(temp.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "The sky is blue.");
        assert_eq!(docs[1].content, "The grass is green.");
        assert_eq!(docs[0].name(), Some("a.txt"));
        assert_eq!(docs[1].meta["split_id"], serde_json::json!(1));
    }

    #[test]
    fn test_single_paragraph_falls_back_to_sentences() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.txt", "The sky is blue. The grass is green.");

        let docs = convert_files_to_docs(temp.path(), &LoaderConfig::default()).unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["The sky is blue.", "The grass is green."]);
        assert_eq!(docs[1].meta["split_id"], serde_json::json!(1));
    }

    #[test]
    fn test_whole_file_mode() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.txt", "one\n\ntwo");

        let config = LoaderConfig {
            split_mode: SplitMode::None,
            ..LoaderConfig::default()
        };
        let docs = convert_files_to_docs(temp.path(), &config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "one two");
        assert!(!docs[0].meta.contains_key("split_id"));
    }

    #[test]
    fn test_skips_hidden_unsupported_and_subdirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.md", "markdown");
        write(temp.path(), "a.txt", "text");
        write(temp.path(), ".hidden.txt", "secret");
        write(temp.path(), "image.png", "binary");
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        write(&temp.path().join("sub"), "c.txt", "nested");

        let docs = convert_files_to_docs(temp.path(), &LoaderConfig::default()).unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["text", "markdown"]);
    }

    #[test]
    fn test_empty_file_produces_nothing() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "empty.txt", "  \n\n ");

        let docs = convert_files_to_docs(temp.path(), &LoaderConfig::default()).unwrap();
        assert!(docs.is_empty());
    }
}
