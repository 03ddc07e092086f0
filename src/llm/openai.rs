//! Chat completions over any OpenAI-compatible endpoint.

use super::ChatModel;
use crate::config::LlmSettings;
use crate::error::{GenerationStage, Result, VidragError};
use crate::openai::{create_client, error_status};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Sends the rendered prompt as a single user message.
pub struct OpenAICompatChat {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

fn prompt_error(e: impl std::fmt::Display) -> VidragError {
    VidragError::generation(GenerationStage::Prompt, e.to_string())
}

impl OpenAICompatChat {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &LlmSettings, api_key: Option<String>) -> Result<Self> {
        let client = create_client(
            Some(&settings.api_base),
            api_key,
            Duration::from_secs(settings.timeout_seconds),
        )?;
        Ok(Self::new(client, &settings.model, settings.temperature))
    }
}

#[async_trait]
impl ChatModel for OpenAICompatChat {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(prompt_error)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(self.temperature)
            .build()
            .map_err(prompt_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidragError::Generation {
                stage: GenerationStage::Completion,
                status: error_status(&e),
                message: e.to_string(),
            })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                VidragError::generation(GenerationStage::Completion, "Empty response from model")
            })?;

        debug!("Model returned {} chars", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
