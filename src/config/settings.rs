//! Configuration settings for vidrag.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Optional `.env` file with provider credentials, loaded at startup.
    pub env_file: Option<String>,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            env_file: Some(".env".to_string()),
            log_level: "info".to_string(),
        }
    }
}

/// Caption fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Base URL of the YouTube web frontend.
    pub base_url: String,
    /// Preferred caption languages, in order.
    pub languages: Vec<String>,
    /// Fall back to the first available track when no preferred language exists.
    pub fallback_to_any: bool,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            languages: vec!["en".to_string()],
            fallback_to_any: true,
            timeout_seconds: 30,
        }
    }
}

/// Splitter kind used to break a transcript into chunks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Recursive separator splitting (paragraph, line, word, character).
    #[default]
    Recursive,
    /// Fixed character windows with exact overlap.
    Window,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "window" | "fixed" => Ok(ChunkingStrategy::Window),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingStrategy::Recursive => write!(f, "recursive"),
            ChunkingStrategy::Window => write!(f, "window"),
        }
    }
}

/// Content chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (recursive, window).
    pub strategy: ChunkingStrategy,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared with the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::Recursive,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingSettings {
    /// Reject sizes the splitters cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunk_size == 0 {
            return Err(crate::error::VidragError::Config(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(crate::error::VidragError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face Inference feature-extraction endpoint.
    #[default]
    HuggingFace,
    /// Any OpenAI-compatible `/embeddings` endpoint.
    OpenAI,
    /// In-process BERT model (requires the `candle` feature).
    Local,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "local" | "candle" => Ok(EmbeddingProvider::Local),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::HuggingFace => write!(f, "huggingface"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Local => write!(f, "local"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (huggingface, openai, local).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Endpoint base URL. Defaults depend on the provider.
    pub api_base: Option<String>,
    /// Environment variable holding the API token.
    pub api_key_env: Option<String>,
    /// Texts per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            api_base: None,
            api_key_env: None,
            batch_size: 32,
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model identifier.
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// Environment variable holding the API token. Defaults to the Hugging Face token.
    pub api_key_env: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            api_base: "https://router.huggingface.co/v1".to_string(),
            api_key_env: None,
            temperature: 0.1,
            timeout_seconds: 300,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the model.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

impl RetrievalSettings {
    /// Reject a `top_k` that would retrieve nothing.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.top_k == 0 {
            return Err(crate::error::VidragError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum number of live sessions before the oldest is evicted.
    pub max_sessions: usize,
    /// Seconds a session stays usable after it was created. 0 disables expiry.
    pub ttl_seconds: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: 64,
            ttl_seconds: 6 * 60 * 60,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Directory with the pre-built frontend.
    pub static_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

/// Environment variables consulted for a Hugging Face token, in order.
pub const HF_TOKEN_VARS: &[&str] = &["HF_TOKEN", "HUGGINGFACEHUB_API_TOKEN"];

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VidragError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidrag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded static frontend directory.
    pub fn static_dir(&self) -> PathBuf {
        Self::expand_path(&self.server.static_dir)
    }

    /// Load the configured `.env` file, if present. Existing variables win.
    pub fn load_env_file(&self) -> Option<PathBuf> {
        let path = Self::expand_path(self.general.env_file.as_deref()?);
        dotenvy::from_path(&path).ok().map(|_| path)
    }

    /// Token for the chat model endpoint.
    pub fn llm_api_key(&self) -> Option<String> {
        match &self.llm.api_key_env {
            Some(var) => read_env(var),
            None => hf_token(),
        }
    }

    /// Token for the embedding endpoint.
    pub fn embedding_api_key(&self) -> Option<String> {
        if let Some(var) = &self.embedding.api_key_env {
            return read_env(var);
        }
        match self.embedding.provider {
            EmbeddingProvider::OpenAI => read_env("OPENAI_API_KEY"),
            EmbeddingProvider::HuggingFace | EmbeddingProvider::Local => hf_token(),
        }
    }
}

/// First non-empty Hugging Face token from the environment.
pub fn hf_token() -> Option<String> {
    HF_TOKEN_VARS.iter().find_map(|var| read_env(var))
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.top_k, 4);
        assert_eq!(settings.youtube.languages, vec!["en".to_string()]);
        assert_eq!(settings.embedding.model, "sentence-transformers/all-MiniLM-L6-v2");
        assert!((settings.llm.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chunking]
strategy = "window"
chunk_size = 500

[embedding]
provider = "openai"
model = "text-embedding-3-small"
"#
        )
        .unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.chunking.strategy, ChunkingStrategy::Window);
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(settings.retrieval.top_k, 4);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.static_dir, "static");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.session.max_sessions = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.session.max_sessions, 3);
    }

    #[test]
    fn test_chunking_validation() {
        assert!(ChunkingSettings::default().validate().is_ok());

        let bad = ChunkingSettings {
            chunk_overlap: 1000,
            ..ChunkingSettings::default()
        };
        assert!(bad.validate().is_err());

        let zero = ChunkingSettings {
            chunk_size: 0,
            chunk_overlap: 0,
            ..ChunkingSettings::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_retrieval_validation() {
        assert!(RetrievalSettings::default().validate().is_ok());
        let err = RetrievalSettings { top_k: 0 }.validate().unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("hf".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::HuggingFace);
        assert_eq!("candle".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Local);
        assert!("faiss".parse::<EmbeddingProvider>().is_err());
        assert_eq!("fixed".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Window);
    }
}
