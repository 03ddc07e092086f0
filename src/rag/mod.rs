//! Retrieval-augmented answering over a single video's transcript.

mod chain;
pub mod context;

pub use chain::{Answer, RagChain};
pub use context::format_context;

#[cfg(test)]
pub(crate) use chain::tests::chain_over;
