//! Question-to-chunks lookup.

use super::{ScoredChunk, VectorIndex};
use crate::embedding::Embedder;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of chunks handed to the model per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Embeds a question with the index's embedder and returns the nearest chunks.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { index, embedder, k }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Up to `k` chunks closest to the question, closest first.
    #[instrument(skip(self, question), fields(k = self.k))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, self.k)?;
        debug!("Retrieved {} of {} chunks", hits.len(), self.index.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::embedding::tests::LetterEmbedder;

    async fn retriever(texts: &[&str]) -> Retriever {
        let embedder = Arc::new(LetterEmbedder::new());
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, *t))
            .collect();
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = embedder.embed_batch(&owned).await.unwrap();
        let index = VectorIndex::build(chunks, embeddings).unwrap();
        Retriever::new(Arc::new(index), embedder, DEFAULT_TOP_K)
    }

    #[tokio::test]
    async fn test_returns_exactly_k() {
        let retriever = retriever(&["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff"]).await;
        let hits = retriever.retrieve("aaaa").await.unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].chunk.content, "aaaa");
    }

    #[tokio::test]
    async fn test_returns_all_when_fewer_than_k() {
        let retriever = retriever(&["aaaa", "bbbb"]).await;
        assert_eq!(retriever.retrieve("zzzz").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let index = VectorIndex::build(vec![Chunk::new(0, "a")], vec![vec![0.0; 26]]).unwrap();
        let retriever = Retriever::new(Arc::new(index), Arc::new(LetterEmbedder::failing()), 4);
        assert!(retriever.retrieve("question").await.is_err());
    }
}
