//! Hugging Face Inference feature-extraction embeddings.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default inference endpoint; the model id is appended.
pub const DEFAULT_HF_INFERENCE_BASE: &str = "https://router.huggingface.co/hf-inference/models";

/// Embedder backed by a hosted sentence-transformers model.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

/// Sentence models return one pooled vector per input; plain encoders
/// return per-token vectors that still need pooling.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    Tokens(Vec<Vec<Vec<f32>>>),
}

impl HuggingFaceEmbedder {
    pub fn new(api_base: &str, model: &str, dimensions: usize, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/pipeline/feature-extraction",
                api_base.trim_end_matches('/'),
                model
            ),
            api_key,
            model: model.to_string(),
            dimensions,
            batch_size: 32,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings, api_key: Option<String>) -> Result<Self> {
        let base = settings
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_HF_INFERENCE_BASE);
        Ok(Self::new(base, &settings.model, settings.dimensions, api_key)?
            .with_batch_size(settings.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&FeatureExtractionRequest { inputs });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VidragError::Embedding(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                self.model,
                body.chars().take(200).collect::<String>()
            )));
        }

        let vectors = match response.json::<FeatureExtractionResponse>().await? {
            FeatureExtractionResponse::Pooled(vectors) => vectors,
            FeatureExtractionResponse::Tokens(tokens) => tokens.iter().map(|t| mean_pool(t)).collect(),
        };

        if vectors.len() != inputs.len() {
            return Err(VidragError::Embedding(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; first.len()];
    for token in tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let n = tokens.len() as f32;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VidragError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all.extend(self.request(batch).await?);
        }
        debug!("Generated {} embeddings", all.len());
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
