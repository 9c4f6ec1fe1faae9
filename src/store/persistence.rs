//! Single-file SQLite snapshot of a vector store
//!
//! Layout:
//! - `settings(key, value)`: similarity, index factory, HNSW params,
//!   duplicate policy, score scaling, embedding dimension and model
//! - `documents(position, id, content, meta, embedding)`: meta as JSON,
//!   embedding as little-endian f32 bytes (NULL when absent)
//!
//! The similarity index itself is not stored; it is rebuilt on load.

use super::vector::Settings;
use super::DuplicatePolicy;
use crate::document::{Document, DocumentId, Meta};
use crate::embedding::{HnswParams, IndexFactory, Similarity};
use crate::error::{QaError, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = "
    CREATE TABLE settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE documents (
        position INTEGER PRIMARY KEY,
        id TEXT NOT NULL UNIQUE,
        content TEXT NOT NULL,
        meta TEXT NOT NULL,
        embedding BLOB
    );
";

/// Everything needed to rebuild a store
pub(super) struct Snapshot {
    pub settings: Settings,
    pub dimension: Option<usize>,
    pub embedding_model: Option<String>,
    pub documents: Vec<Document>,
}

/// Write the snapshot to `path`, replacing any existing file atomically
pub(super) fn save(
    path: &Path,
    settings: &Settings,
    dimension: Option<usize>,
    embedding_model: Option<&str>,
    documents: &[Document],
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            QaError::io(e, format!("Failed to create index directory: {:?}", parent))
        })?;
    }

    let temp_path = temp_path(path);
    if temp_path.exists() {
        fs::remove_file(&temp_path).map_err(|e| {
            QaError::io(e, format!("Failed to remove stale temp file: {:?}", temp_path))
        })?;
    }

    write_snapshot(&temp_path, settings, dimension, embedding_model, documents)?;

    fs::rename(&temp_path, path).map_err(|e| {
        QaError::io(
            e,
            format!("Failed to move index into place: {:?} -> {:?}", temp_path, path),
        )
    })?;

    tracing::info!("Saved {} documents to {}", documents.len(), path.display());
    Ok(())
}

fn write_snapshot(
    path: &Path,
    settings: &Settings,
    dimension: Option<usize>,
    embedding_model: Option<&str>,
    documents: &[Document],
) -> Result<()> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    {
        let mut insert_setting =
            tx.prepare("INSERT INTO settings (key, value) VALUES (?1, ?2)")?;
        let hnsw = settings.hnsw;
        let pairs = [
            ("format_version", FORMAT_VERSION.to_string()),
            ("similarity", settings.similarity.as_str().to_string()),
            ("index_factory", settings.index_factory.as_str().to_string()),
            ("hnsw_m", hnsw.m.to_string()),
            ("hnsw_ef_construction", hnsw.ef_construction.to_string()),
            ("hnsw_ef_search", hnsw.ef_search.to_string()),
            ("duplicate_documents", settings.policy.as_str().to_string()),
            ("scale_score", settings.scale_score.to_string()),
        ];
        for (key, value) in pairs {
            insert_setting.execute(params![key, value])?;
        }
        if let Some(dimension) = dimension {
            insert_setting.execute(params!["embedding_dim", dimension.to_string()])?;
        }
        if let Some(model) = embedding_model {
            insert_setting.execute(params!["embedding_model", model])?;
        }

        let mut insert_doc = tx.prepare(
            "INSERT INTO documents (position, id, content, meta, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, doc) in documents.iter().enumerate() {
            let meta = serde_json::to_string(&doc.meta).map_err(|e| QaError::Json {
                source: e,
                context: format!("Failed to serialize metadata of {}", doc.id),
            })?;
            let embedding = doc.embedding.as_deref().map(encode_vector);
            insert_doc.execute(params![
                position as i64,
                doc.id.as_str(),
                doc.content,
                meta,
                embedding
            ])?;
        }
    }
    tx.commit()?;

    Ok(())
}

/// Read a snapshot; any malformed content is reported as [`QaError::IndexLoad`]
pub(super) fn load(path: &Path) -> Result<Snapshot> {
    if !path.is_file() {
        return Err(load_error(path, "file does not exist"));
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| load_error(path, e))?;

    let settings_map = read_settings(&conn).map_err(|e| load_error(path, e))?;
    let setting = |key: &str| {
        settings_map
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| load_error(path, format!("missing setting '{}'", key)))
    };

    let version = setting("format_version")?;
    if version != FORMAT_VERSION {
        return Err(load_error(
            path,
            format!("unsupported format version '{}'", version),
        ));
    }

    let similarity = Similarity::parse(setting("similarity")?)
        .ok_or_else(|| load_error(path, "unknown similarity"))?;
    let index_factory = IndexFactory::parse(setting("index_factory")?)
        .ok_or_else(|| load_error(path, "unknown index factory"))?;
    let policy = DuplicatePolicy::parse(setting("duplicate_documents")?)
        .ok_or_else(|| load_error(path, "unknown duplicate policy"))?;
    let scale_score = setting("scale_score")?
        .parse::<bool>()
        .map_err(|e| load_error(path, e))?;
    let number = |key: &str| -> Result<usize> {
        setting(key)?.parse::<usize>().map_err(|e| load_error(path, e))
    };
    let hnsw = HnswParams {
        m: number("hnsw_m")?,
        ef_construction: number("hnsw_ef_construction")?,
        ef_search: number("hnsw_ef_search")?,
    };
    let dimension = match settings_map.get("embedding_dim") {
        Some(_) => Some(number("embedding_dim")?),
        None => None,
    };

    let embedding_model = settings_map.get("embedding_model").cloned();

    let documents = read_documents(&conn, path)?;

    Ok(Snapshot {
        settings: Settings {
            policy,
            similarity,
            index_factory,
            hnsw,
            scale_score,
        },
        dimension,
        embedding_model,
        documents,
    })
}

fn read_settings(conn: &Connection) -> rusqlite::Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    rows.collect()
}

fn read_documents(conn: &Connection, path: &Path) -> Result<Vec<Document>> {
    let mut stmt = conn
        .prepare("SELECT id, content, meta, embedding FROM documents ORDER BY position")
        .map_err(|e| load_error(path, e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<Vec<u8>>>(3)?,
            ))
        })
        .map_err(|e| load_error(path, e))?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, content, meta, embedding) = row.map_err(|e| load_error(path, e))?;
        let meta: Meta = serde_json::from_str(&meta)
            .map_err(|e| load_error(path, format!("bad metadata for {}: {}", id, e)))?;
        let embedding = match embedding {
            Some(bytes) => Some(
                decode_vector(&bytes)
                    .ok_or_else(|| load_error(path, format!("bad embedding for {}", id)))?,
            ),
            None => None,
        };

        documents.push(Document {
            id: DocumentId::from(id),
            content,
            meta,
            embedding,
        });
    }

    Ok(documents)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn load_error(path: &Path, message: impl ToString) -> QaError {
    QaError::IndexLoad {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
