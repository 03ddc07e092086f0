//! Sentence embeddings for chunk indexing and question lookup.

mod huggingface;
#[cfg(feature = "candle")]
mod local;
mod openai;

pub use huggingface::HuggingFaceEmbedder;
#[cfg(feature = "candle")]
pub use local::LocalEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Model identifier, for logs and diagnostics.
    fn model_name(&self) -> &str;
}

/// Create the configured embedder.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let embedding = &settings.embedding;
    let api_key = settings.embedding_api_key();

    match embedding.provider {
        EmbeddingProvider::HuggingFace => Ok(Arc::new(HuggingFaceEmbedder::from_settings(
            embedding, api_key,
        )?)),
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::from_settings(
            embedding, api_key,
        )?)),
        #[cfg(feature = "candle")]
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedder::load(&embedding.model)?)),
        #[cfg(not(feature = "candle"))]
        EmbeddingProvider::Local => Err(crate::error::VidragError::Config(
            "Local embeddings require building with the `candle` feature".to_string(),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::VidragError;

    /// Deterministic bag-of-letters embedder for tests.
    ///
    /// Each dimension counts one lowercase letter, so texts sharing
    /// vocabulary land close together.
    pub struct LetterEmbedder {
        pub fail: bool,
    }

    impl LetterEmbedder {
        pub fn new() -> Self {
            Self { fail: false }
        }

        pub fn failing() -> Self {
            Self { fail: true }
        }

        pub fn vector(text: &str) -> Vec<f32> {
            let mut v = vec![0.0; 26];
            for c in text.chars().flat_map(char::to_lowercase) {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            v
        }
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(VidragError::Embedding("embedder offline".to_string()));
            }
            Ok(Self::vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail {
                return Err(VidragError::Embedding("embedder offline".to_string()));
            }
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        fn dimensions(&self) -> usize {
            26
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    #[test]
    fn test_create_default_embedder() {
        let embedder = create_embedder(&Settings::default()).unwrap();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.model_name(), "sentence-transformers/all-MiniLM-L6-v2");
    }

    #[cfg(not(feature = "candle"))]
    #[test]
    fn test_local_requires_feature() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Local;
        assert!(matches!(
            create_embedder(&settings),
            Err(VidragError::Config(_))
        ));
    }
}
