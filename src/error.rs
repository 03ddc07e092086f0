//! Error types for vidrag.

use thiserror::Error;

/// Why a transcript could not be produced for a video.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptFailure {
    #[error("Subtitles are disabled for this video")]
    CaptionsDisabled,

    #[error("No transcript found for languages {requested:?} and no fallback available")]
    NoTranscriptFound { requested: Vec<String> },

    #[error("Video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Transcript is empty")]
    Empty,

    #[error("Captions provider error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Provider { status: Option<u16>, message: String },
}

/// Where in the answering path a generation failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    /// Embedding the question or searching the index.
    Retrieval,
    /// Filling the prompt template.
    Prompt,
    /// Calling the remote chat model.
    Completion,
}

impl std::fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStage::Retrieval => write!(f, "retrieval"),
            GenerationStage::Prompt => write!(f, "prompt"),
            GenerationStage::Completion => write!(f, "completion"),
        }
    }
}

/// Library-level error type for vidrag operations.
#[derive(Error, Debug)]
pub enum VidragError {
    #[error("Invalid YouTube URL: {url}")]
    InvalidUrl { url: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch transcript for {video_id}: {reason}")]
    TranscriptUnavailable {
        video_id: String,
        reason: TranscriptFailure,
    },

    #[error("Generation failed during {stage}: {message}")]
    Generation {
        stage: GenerationStage,
        status: Option<u16>,
        message: String,
    },

    #[error("No video processed yet. Please process a video first.")]
    NoSession,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VidragError {
    /// Build a transcript failure for the given video.
    pub fn transcript(video_id: impl Into<String>, reason: TranscriptFailure) -> Self {
        VidragError::TranscriptUnavailable {
            video_id: video_id.into(),
            reason,
        }
    }

    /// Build a generation failure without an upstream status.
    pub fn generation(stage: GenerationStage, message: impl Into<String>) -> Self {
        VidragError::Generation {
            stage,
            status: None,
            message: message.into(),
        }
    }

    /// Whether retrying the same call might succeed.
    ///
    /// Transport errors and upstream 408/429/5xx responses are transient;
    /// bad input, disabled captions and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            VidragError::TranscriptUnavailable {
                reason: TranscriptFailure::Provider { status, .. },
                ..
            } => status_is_transient(*status),
            VidragError::Generation { stage, status, .. } => {
                *stage != GenerationStage::Prompt && status_is_transient(*status)
            }
            VidragError::Http(e) => {
                e.is_timeout() || e.is_connect() || status_is_transient(e.status().map(|s| s.as_u16()))
            }
            _ => false,
        }
    }
}

/// `None` means the request never got a response (transport failure).
fn status_is_transient(status: Option<u16>) -> bool {
    match status {
        None => true,
        Some(code) => code == 408 || code == 429 || (500..600).contains(&code),
    }
}

/// Result type alias for vidrag operations.
pub type Result<T> = std::result::Result<T, VidragError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_error_message() {
        let err = VidragError::transcript("Gfr50f6ZBvo", TranscriptFailure::CaptionsDisabled);
        assert_eq!(
            err.to_string(),
            "Failed to fetch transcript for Gfr50f6ZBvo: Subtitles are disabled for this video"
        );

        let err = VidragError::transcript(
            "Gfr50f6ZBvo",
            TranscriptFailure::Provider {
                status: Some(503),
                message: "upstream".to_string(),
            },
        );
        assert!(err.to_string().contains("(HTTP 503)"));
    }

    #[test]
    fn test_retryable_classification() {
        let transient = VidragError::transcript(
            "abc",
            TranscriptFailure::Provider {
                status: Some(429),
                message: "slow down".to_string(),
            },
        );
        assert!(transient.is_retryable());

        let terminal = VidragError::transcript("abc", TranscriptFailure::CaptionsDisabled);
        assert!(!terminal.is_retryable());

        let auth = VidragError::Generation {
            stage: GenerationStage::Completion,
            status: Some(401),
            message: "bad token".to_string(),
        };
        assert!(!auth.is_retryable());

        let transport = VidragError::generation(GenerationStage::Completion, "connection reset");
        assert!(transport.is_retryable());

        let prompt = VidragError::generation(GenerationStage::Prompt, "missing slot");
        assert!(!prompt.is_retryable());

        assert!(!VidragError::NoSession.is_retryable());
        assert!(!VidragError::InvalidUrl { url: "x".to_string() }.is_retryable());
    }
}
