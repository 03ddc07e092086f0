//! Generative model access.

mod openai;

pub use openai::OpenAICompatChat;

use crate::error::Result;
use async_trait::async_trait;

/// A text-in, text-out language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a fully rendered prompt. The returned text is used verbatim.
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs and diagnostics.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{GenerationStage, VidragError};
    use std::sync::Mutex;

    /// Records prompts and answers with a fixed reply.
    pub struct RecordingModel {
        pub reply: String,
        pub fail: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    impl RecordingModel {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new("")
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn invoke(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(VidragError::Generation {
                    stage: GenerationStage::Completion,
                    status: Some(503),
                    message: "model overloaded".to_string(),
                });
            }
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }
}
