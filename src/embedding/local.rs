//! In-process BERT sentence embeddings via candle.

use super::Embedder;
use crate::error::{Result, VidragError};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::{info, instrument};

struct Model {
    bert: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Sentence embedder running a BERT model from the Hugging Face Hub on CPU.
#[derive(Clone)]
pub struct LocalEmbedder {
    model: Arc<Model>,
    name: String,
    dimensions: usize,
}

fn load_error(e: impl std::fmt::Display) -> VidragError {
    VidragError::Embedding(format!("Failed to load local model: {}", e))
}

fn inference_error(e: impl std::fmt::Display) -> VidragError {
    VidragError::Embedding(format!("Local inference failed: {}", e))
}

impl LocalEmbedder {
    /// Download (or reuse the cached) model and load it.
    pub fn load(repo_id: &str) -> Result<Self> {
        info!("Loading local embedding model {}", repo_id);
        let device = Device::Cpu;

        let api = hf_hub::api::sync::Api::new().map_err(load_error)?;
        let repo = api.model(repo_id.to_owned());
        let config_path = repo.get("config.json").map_err(load_error)?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(load_error)?;
        let weights_path = repo.get("model.safetensors").map_err(load_error)?;

        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(load_error)?;

        // SAFETY: the safetensors file comes from the hf-hub cache and is not
        // modified while the mapping is alive.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .map_err(load_error)?
        };
        let bert = BertModel::load(vb, &config).map_err(load_error)?;

        Ok(Self {
            dimensions: config.hidden_size,
            model: Arc::new(Model {
                bert,
                tokenizer,
                device,
            }),
            name: repo_id.to_string(),
        })
    }
}

impl Model {
    /// Mean-pooled, L2-normalized embedding of one text.
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenizer.encode(text, true).map_err(inference_error)?;
        let ids = encoding.get_ids();
        let type_ids = vec![0u32; ids.len()];

        let forward = || -> candle_core::Result<Vec<f32>> {
            let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
            let token_type_ids = Tensor::new(type_ids.as_slice(), &self.device)?.unsqueeze(0)?;
            let hidden = self.bert.forward(&input_ids, &token_type_ids, None)?;

            let seq_len = hidden.dim(1)? as f64;
            let pooled = (hidden.sum(1)? / seq_len)?;
            let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            pooled.broadcast_div(&norm)?.squeeze(0)?.to_vec1::<f32>()
        };
        forward().map_err(inference_error)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed_sync(&text))
            .await
            .map_err(inference_error)?
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || texts.iter().map(|t| model.embed_sync(t)).collect())
            .await
            .map_err(inference_error)?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
