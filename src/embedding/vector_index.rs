/// Vector similarity index: exact (flat) or approximate (HNSW)
use hnsw_rs::prelude::*;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Unsupported combination: {0}")]
    Unsupported(String),
}

/// Similarity function used to compare embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Cosine similarity; vectors are L2-normalised on insert
    Cosine,
    /// Raw inner product
    DotProduct,
}

impl Similarity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cosine" => Some(Self::Cosine),
            "dot_product" => Some(Self::DotProduct),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::DotProduct => "dot_product",
        }
    }

    /// Map a raw similarity into [0, 1]
    pub fn scale(&self, score: f32) -> f32 {
        match self {
            Self::Cosine => ((score + 1.0) / 2.0).clamp(0.0, 1.0),
            Self::DotProduct => 1.0 / (1.0 + (-score / 100.0).exp()),
        }
    }
}

/// Kind of similarity index to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFactory {
    /// Brute force over every vector; exact
    Flat,
    /// Hierarchical navigable small world graph; approximate, cosine only
    Hnsw,
}

impl IndexFactory {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "hnsw" => Some(Self::Hnsw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Hnsw => "hnsw",
        }
    }
}

/// HNSW tuning parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HnswParams {
    /// Number of connections per layer
    pub m: usize,
    /// Construction beam width (higher = better recall, slower build)
    pub ef_construction: usize,
    /// Search beam width (higher = better recall, slower search)
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
        }
    }
}

/// Search hit: position of the vector as given to [`VectorIndex::build`]
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub position: usize,
    /// Raw similarity (cosine or inner product), higher is more similar
    pub score: f32,
}

enum Backend {
    Flat {
        matrix: Array2<f32>,
        positions: Vec<usize>,
    },
    Hnsw {
        graph: Hnsw<'static, f32, DistCosine>,
        params: HnswParams,
    },
}

/// Similarity index over a fixed set of vectors
///
/// The index is rebuilt from scratch whenever embeddings change; there is no
/// incremental insert.
pub struct VectorIndex {
    backend: Backend,
    similarity: Similarity,
    dimension: usize,
    count: usize,
}

impl VectorIndex {
    /// Build an index over `vectors`, given as `(position, vector)` pairs
    ///
    /// Vectors are normalised first when the similarity is cosine.
    pub fn build(
        factory: IndexFactory,
        similarity: Similarity,
        dimension: usize,
        params: HnswParams,
        vectors: &[(usize, &[f32])],
    ) -> Result<Self, VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InitializationError(
                "Vector dimension must be greater than 0".to_string(),
            ));
        }

        for (_, vector) in vectors {
            if vector.len() != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        let prepared: Vec<(usize, Vec<f32>)> = vectors
            .iter()
            .map(|(pos, v)| (*pos, prepare(similarity, v)))
            .collect();

        let backend = match factory {
            IndexFactory::Flat => {
                let positions: Vec<usize> = prepared.iter().map(|(pos, _)| *pos).collect();
                let flat: Vec<f32> = prepared.into_iter().flat_map(|(_, v)| v).collect();
                let matrix = Array2::from_shape_vec((positions.len(), dimension), flat)
                    .map_err(|e| VectorIndexError::InitializationError(e.to_string()))?;
                Backend::Flat { matrix, positions }
            }
            IndexFactory::Hnsw => {
                if similarity != Similarity::Cosine {
                    return Err(VectorIndexError::Unsupported(
                        "hnsw index only supports cosine similarity".to_string(),
                    ));
                }

                let graph = Hnsw::<f32, DistCosine>::new(
                    params.m,
                    prepared.len().max(1),
                    16, // max layers
                    params.ef_construction,
                    DistCosine,
                );

                for (pos, vector) in &prepared {
                    // A zero vector has no direction and cannot be ranked
                    if vector.iter().all(|x| *x == 0.0) {
                        tracing::debug!("Skipping zero vector at position {}", pos);
                        continue;
                    }
                    graph.insert((vector.as_slice(), *pos));
                }

                Backend::Hnsw { graph, params }
            }
        };

        Ok(Self {
            backend,
            similarity,
            dimension,
            count: vectors.len(),
        })
    }

    /// Search for the `k` most similar vectors
    ///
    /// # Returns
    /// Hits sorted by score descending, ties broken by position
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if k == 0 || self.count == 0 {
            return Ok(Vec::new());
        }

        let query = prepare(self.similarity, query);

        let mut results: Vec<SearchResult> = match &self.backend {
            Backend::Flat { matrix, positions } => {
                let scores = matrix.dot(&ArrayView1::from(query.as_slice()));
                positions
                    .iter()
                    .zip(scores.iter())
                    .map(|(position, score)| SearchResult {
                        position: *position,
                        score: *score,
                    })
                    .collect()
            }
            Backend::Hnsw { graph, params } => {
                if query.iter().all(|x| *x == 0.0) {
                    return Ok(Vec::new());
                }
                graph
                    .search(&query, k, params.ef_search.max(k))
                    .into_iter()
                    .map(|neighbour| SearchResult {
                        position: neighbour.d_id,
                        score: 1.0 - neighbour.distance,
                    })
                    .collect()
            }
        };

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        results.truncate(k);

        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }
}

fn prepare(similarity: Similarity, vector: &[f32]) -> Vec<f32> {
    match similarity {
        Similarity::Cosine => normalize(vector),
        Similarity::DotProduct => vector.to_vec(),
    }
}

/// L2-normalise a vector; the zero vector is returned unchanged
fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter().map(|x| x / norm).collect()
    } else {
        vector.to_vec()
    }
}
