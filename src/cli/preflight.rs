//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are available before starting operations
//! that would otherwise fail after the transcript has been downloaded.

use crate::config::{EmbeddingProvider, Settings, HF_TOKEN_VARS};
use crate::error::{Result, VidragError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving needs model and embedding credentials.
    Serve,
    /// Asking needs model and embedding credentials.
    Ask,
    /// Fetching a transcript needs nothing.
    Transcript,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ask => {
            check_llm_key(settings)?;
            check_embedding_key(settings)?;
        }
        Operation::Transcript => {}
    }
    Ok(())
}

fn check_llm_key(settings: &Settings) -> Result<()> {
    if settings.llm_api_key().is_some() {
        return Ok(());
    }
    let var = settings
        .llm
        .api_key_env
        .clone()
        .unwrap_or_else(|| HF_TOKEN_VARS.join(" or "));
    Err(VidragError::Config(format!(
        "No API token for {}. Set {} (a .env file works too).",
        settings.llm.api_base, var
    )))
}

fn check_embedding_key(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        // Public models work anonymously, just rate limited.
        EmbeddingProvider::Local | EmbeddingProvider::HuggingFace => Ok(()),
        EmbeddingProvider::OpenAI if settings.embedding_api_key().is_some() => Ok(()),
        EmbeddingProvider::OpenAI => Err(VidragError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_has_no_requirements() {
        tokio_test::assert_ok!(check(Operation::Transcript, &Settings::default()));
    }

    #[test]
    fn test_missing_custom_llm_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = Some("VIDRAG_TEST_UNSET_TOKEN".to_string());
        let err = check(Operation::Ask, &settings).unwrap_err();
        assert!(err.to_string().contains("VIDRAG_TEST_UNSET_TOKEN"));
    }
}
