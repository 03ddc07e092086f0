//! vidrag - Ask questions about a YouTube video
//!
//! Fetches a video's captions, indexes them in memory and answers questions
//! with a language model grounded on the most relevant transcript chunks.
//!
//! # Architecture
//!
//! - `source` - YouTube URL parsing
//! - `transcript` - Caption track discovery and download
//! - `chunking` - Transcript splitting
//! - `embedding` - Embedding providers
//! - `vector_index` - In-memory nearest-neighbour search and retrieval
//! - `llm` - Chat model access
//! - `rag` - Per-video answering chain
//! - `pipeline` - URL to ready chain
//! - `session` - Per-client chain slots
//! - `server` - HTTP API and static frontend
//!
//! # Example
//!
//! ```rust,no_run
//! use vidrag::config::Settings;
//! use vidrag::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!
//!     let chain = pipeline.build_chain("https://www.youtube.com/watch?v=Gfr50f6ZBvo").await?;
//!     let answer = chain.answer("What is this video about?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod server;
pub mod session;
pub mod source;
pub mod transcript;
pub mod vector_index;

pub use error::{Result, VidragError};
