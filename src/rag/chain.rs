//! The per-video answering chain.

use super::context::format_context;
use crate::config::PromptTemplate;
use crate::error::{GenerationStage, Result, VidragError};
use crate::llm::ChatModel;
use crate::source::VideoId;
use crate::vector_index::{Retriever, ScoredChunk};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Model output, unmodified.
    pub text: String,
    /// Retrieved chunks, closest first.
    pub sources: Vec<ScoredChunk>,
}

/// Retriever, prompt and model bound to one processed video.
///
/// Immutable after construction, so it can be shared across requests.
pub struct RagChain {
    video_id: VideoId,
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
}

impl RagChain {
    pub fn new(
        video_id: VideoId,
        retriever: Retriever,
        model: Arc<dyn ChatModel>,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            video_id,
            retriever,
            model,
            prompt,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.retriever.index().len()
    }

    /// Answer a question from the indexed transcript.
    #[instrument(skip(self, question), fields(video_id = %self.video_id))]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(VidragError::InvalidInput("Question is empty".to_string()));
        }

        info!("Answering question: {}", question);

        let sources = self.retriever.retrieve(question).await.map_err(|e| match e {
            VidragError::Generation { .. } => e,
            other => VidragError::generation(GenerationStage::Retrieval, other.to_string()),
        })?;

        let context = format_context(&sources);
        let prompt = self.prompt.render(&context, question);
        debug!("Prompt has {} chars from {} chunks", prompt.len(), sources.len());

        let text = self.model.invoke(&prompt).await.map_err(|e| match e {
            VidragError::Generation { .. } => e,
            other => VidragError::generation(GenerationStage::Completion, other.to_string()),
        })?;

        Ok(Answer { text, sources })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::embedding::tests::LetterEmbedder;
    use crate::embedding::Embedder;
    use crate::llm::tests::RecordingModel;
    use crate::vector_index::{VectorIndex, DEFAULT_TOP_K};

    pub(crate) async fn chain_over(
        texts: &[&str],
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
    ) -> RagChain {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, *t))
            .collect();
        let vectors = texts.iter().map(|t| LetterEmbedder::vector(t)).collect();
        let index = VectorIndex::build(chunks, vectors).unwrap();
        RagChain::new(
            VideoId::parse("Gfr50f6ZBvo").unwrap(),
            Retriever::new(Arc::new(index), embedder, DEFAULT_TOP_K),
            model,
            PromptTemplate::default(),
        )
    }

    #[tokio::test]
    async fn test_answer_fills_prompt_and_returns_model_text() {
        let model = Arc::new(RecordingModel::new("Cats sleep a lot."));
        let chain = chain_over(
            &["cats sleep all day", "dogs bark at night", "birds sing"],
            Arc::new(LetterEmbedder::new()),
            model.clone(),
        )
        .await;

        let answer = chain.answer("Do cats sleep?").await.unwrap();
        assert_eq!(answer.text, "Cats sleep a lot.");
        assert_eq!(answer.sources.len(), 3);

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("cats sleep all day\n\n"));
        assert!(prompt.contains("Do cats sleep?"));
        assert!(!prompt.contains("{{"));
    }

    #[tokio::test]
    async fn test_question_embedding_failure_is_retrieval_error() {
        let model = Arc::new(RecordingModel::new("unused"));
        let chain = chain_over(&["text"], Arc::new(LetterEmbedder::failing()), model.clone()).await;

        let err = chain.answer("anything?").await.unwrap_err();
        assert!(matches!(
            err,
            VidragError::Generation {
                stage: GenerationStage::Retrieval,
                ..
            }
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_status() {
        let chain = chain_over(
            &["text"],
            Arc::new(LetterEmbedder::new()),
            Arc::new(RecordingModel::failing()),
        )
        .await;

        let err = chain.answer("anything?").await.unwrap_err();
        assert!(matches!(
            err,
            VidragError::Generation {
                stage: GenerationStage::Completion,
                status: Some(503),
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let model = Arc::new(RecordingModel::new("unused"));
        let chain = chain_over(&["text"], Arc::new(LetterEmbedder::new()), model.clone()).await;
        let err = chain.answer("   ").await.unwrap_err();
        assert!(matches!(err, VidragError::InvalidInput(_)));
        assert!(!err.is_retryable());
        assert_eq!(model.calls(), 0);
    }
}
