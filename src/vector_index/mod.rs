//! In-memory nearest-neighbour index over one transcript's chunks.

mod retriever;

pub use retriever::{Retriever, DEFAULT_TOP_K};

use crate::chunking::Chunk;
use crate::error::{Result, VidragError};

/// A chunk matched by a search, with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Squared Euclidean distance (lower is closer).
    pub distance: f32,
}

/// Flat index: every query is compared against every stored vector.
///
/// Immutable once built; a new video gets a new index.
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings (same order).
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(VidragError::Index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Err(VidragError::Index("Cannot build an empty index".to_string()));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(VidragError::Index("Embeddings have no dimensions".to_string()));
        }
        if let Some(pos) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(VidragError::Index(format!(
                "Embedding {} has {} dimensions, expected {}",
                pos,
                embeddings[pos].len(),
                dimensions
            )));
        }

        Ok(Self {
            chunks,
            embeddings,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The `k` nearest chunks, closest first. Equal distances keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(VidragError::Index(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, squared_l2(query, e)))
            .collect();

        // Stable sort keeps chunk order among ties.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                distance,
            })
            .collect())
    }
}

/// Squared Euclidean distance between two vectors of equal length.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
