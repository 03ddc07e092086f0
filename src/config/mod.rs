//! Configuration module for vidrag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{render, PromptTemplate, Prompts, RagPrompts};
pub use settings::{
    hf_token, ChunkingSettings, ChunkingStrategy, EmbeddingProvider, EmbeddingSettings,
    GeneralSettings, LlmSettings, PromptSettings, RetrievalSettings, ServerSettings,
    SessionSettings, Settings, YoutubeSettings, HF_TOKEN_VARS,
};
