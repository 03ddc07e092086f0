//! Video processing pipeline.
//!
//! Turns a YouTube URL into a ready-to-query [`RagChain`]: extract the video
//! id, fetch the transcript, split it, embed the chunks and build the index.

use crate::chunking::{create_splitter, TextSplitter};
use crate::config::{PromptTemplate, Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, TranscriptFailure, VidragError};
use crate::llm::{ChatModel, OpenAICompatChat};
use crate::rag::RagChain;
use crate::source::extract_video_id;
use crate::transcript::{fetch_transcript, CaptionProvider, LanguagePreference, TranscriptText, YoutubeCaptions};
use crate::vector_index::{Retriever, VectorIndex};
use std::sync::Arc;
use tracing::{info, instrument};

/// Everything needed to process a video, shared by all requests.
pub struct Pipeline {
    captions: Arc<dyn CaptionProvider>,
    splitter: Arc<dyn TextSplitter>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    preference: LanguagePreference,
    top_k: usize,
}

impl Pipeline {
    /// Create a pipeline with the providers named in the settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.retrieval.validate()?;
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let splitter: Arc<dyn TextSplitter> = Arc::from(create_splitter(&settings.chunking)?);
        let model = OpenAICompatChat::from_settings(&settings.llm, settings.llm_api_key())?;

        info!(
            "Pipeline ready (embeddings: {} via {}, model: {})",
            settings.embedding.model, settings.embedding.provider, settings.llm.model
        );

        Ok(Self::with_components(
            Arc::new(YoutubeCaptions::from_settings(&settings.youtube)?),
            splitter,
            create_embedder(settings)?,
            Arc::new(model),
        )
        .with_prompt(prompts.answer_template()?)
        .with_language_preference(LanguagePreference::from(&settings.youtube))
        .with_top_k(settings.retrieval.top_k))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        captions: Arc<dyn CaptionProvider>,
        splitter: Arc<dyn TextSplitter>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            captions,
            splitter,
            embedder,
            model,
            prompt: PromptTemplate::default(),
            preference: LanguagePreference::default(),
            top_k: crate::vector_index::DEFAULT_TOP_K,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_language_preference(mut self, preference: LanguagePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Fetch the transcript of the video behind a URL.
    pub async fn transcript(&self, url: &str) -> Result<TranscriptText> {
        let video_id = extract_video_id(url)?;
        fetch_transcript(self.captions.as_ref(), &video_id, &self.preference).await
    }

    /// Run the full ingestion path for one video.
    ///
    /// Nothing is shared until the chain is returned, so a failure at any
    /// step leaves no partial state behind.
    #[instrument(skip(self))]
    pub async fn build_chain(&self, url: &str) -> Result<RagChain> {
        let transcript = self.transcript(url).await?;
        let video_id = transcript.video_id.clone();

        let chunks = self.splitter.split(&transcript.text);
        if chunks.is_empty() {
            return Err(VidragError::transcript(video_id.as_str(), TranscriptFailure::Empty));
        }
        info!("Split transcript into {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let index = VectorIndex::build(chunks, embeddings)?;

        info!(
            "Indexed {} chunks ({} dims) for {}",
            index.len(),
            index.dimensions(),
            video_id
        );

        let retriever = Retriever::new(Arc::new(index), self.embedder.clone(), self.top_k);
        Ok(RagChain::new(
            video_id,
            retriever,
            self.model.clone(),
            self.prompt.clone(),
        ))
    }
}
