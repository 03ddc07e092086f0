//! Transcript chunking.
//!
//! Splits one transcript blob into bounded, overlapping chunks that become
//! the retrieval units of the index. Lengths are measured in characters.

mod recursive;
mod window;

pub use recursive::RecursiveSplitter;
pub use window::WindowSplitter;

use crate::config::{ChunkingSettings, ChunkingStrategy};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A bounded piece of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the source text.
    pub order: usize,
    /// Text content of this chunk.
    pub content: String,
}

impl Chunk {
    pub fn new(order: usize, content: impl Into<String>) -> Self {
        Self {
            order,
            content: content.into(),
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Chunk size limits shared by all splitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Trait for text splitters.
pub trait TextSplitter: Send + Sync {
    /// Split text into ordered chunks. Deterministic for a given input.
    fn split(&self, text: &str) -> Vec<Chunk>;
}

/// Create a splitter from settings.
pub fn create_splitter(settings: &ChunkingSettings) -> Result<Box<dyn TextSplitter>> {
    settings.validate()?;
    let config = ChunkingConfig::from(settings);
    Ok(match settings.strategy {
        ChunkingStrategy::Recursive => Box::new(RecursiveSplitter::new(config)),
        ChunkingStrategy::Window => Box::new(WindowSplitter::new(config)),
    })
}
