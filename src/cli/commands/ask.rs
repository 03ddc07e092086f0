//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Process a video and answer one question about it.
pub async fn run_ask(url: &str, question: &str, show_sources: bool, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidrag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = Pipeline::from_settings(&settings)?;

    let spinner = Output::spinner("Fetching and indexing transcript...");
    let chain = match pipeline.build_chain(url).await {
        Ok(chain) => chain,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    spinner.set_message(format!(
        "Indexed {} chunks, asking {}...",
        chain.chunk_count(),
        settings.llm.model
    ));

    match chain.answer(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.text.trim());

            if show_sources && !answer.sources.is_empty() {
                Output::header("Sources");
                for (rank, source) in answer.sources.iter().enumerate() {
                    Output::source(rank + 1, source.distance, &source.chunk.content);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            if e.is_retryable() {
                Output::info("This looks temporary; try again in a moment.");
            }
            return Err(e.into());
        }
    }

    Ok(())
}
